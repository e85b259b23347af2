//! Data copy stage
//!
//! Paginates through the source table with Scan and replays every item
//! into the destination through BatchWriteItem. Items are copied verbatim;
//! no attribute transformation. Scan order is whatever segment order the
//! service returns, and writes are keyed upserts, so re-running the copy
//! is idempotent at the item level.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use tokio::time::sleep;

use crate::error::{sdk_error_message, CopyError};
use crate::retry::BackoffPolicy;

/// Maximum requests per BatchWriteItem call (DynamoDB limit).
pub const MAX_BATCH_SIZE: usize = 25;

/// Options for the copy stage.
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Per-page item cap forwarded to Scan; `None` means service default
    pub scan_page_limit: Option<i32>,

    /// Backoff policy for unprocessed-item retries
    pub backoff: BackoffPolicy,
}

/// Counters reported after a completed copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub items_copied: u64,
    pub pages_scanned: u64,
}

/// Buffers put requests and flushes them in groups of at most
/// [`MAX_BATCH_SIZE`].
///
/// Unprocessed items returned by BatchWriteItem are retried with backoff;
/// items that survive the retry budget fail the run with
/// [`CopyError::PartialWrite`] instead of being dropped.
struct BatchWriter<'a> {
    client: &'a Client,
    table: String,
    buffer: Vec<WriteRequest>,
    backoff: BackoffPolicy,
    written: u64,
}

impl<'a> BatchWriter<'a> {
    fn new(client: &'a Client, table: &str, backoff: BackoffPolicy) -> Self {
        Self {
            client,
            table: table.to_string(),
            buffer: Vec::with_capacity(MAX_BATCH_SIZE),
            backoff,
            written: 0,
        }
    }

    /// Queue one item, flushing when the buffer reaches the batch limit.
    async fn put(&mut self, item: HashMap<String, AttributeValue>) -> Result<(), CopyError> {
        self.buffer.push(build_put_request(item)?);
        if self.buffer.len() >= MAX_BATCH_SIZE {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush the current buffer, retrying unprocessed items.
    async fn flush(&mut self) -> Result<(), CopyError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch: Vec<WriteRequest> = self.buffer.drain(..).collect();
        let batch_len = batch.len();
        let mut pending = batch;
        let mut attempt = 0;

        loop {
            let output = self
                .client
                .batch_write_item()
                .request_items(self.table.clone(), pending.clone())
                .send()
                .await
                .map_err(|err| CopyError::Sdk(sdk_error_message(&err)))?;

            pending = remaining_unprocessed(output.unprocessed_items, &self.table);
            if pending.is_empty() {
                break;
            }

            if attempt >= self.backoff.max_retries {
                return Err(CopyError::PartialWrite {
                    unprocessed: pending.len(),
                    retries: self.backoff.max_retries,
                });
            }

            let delay = self.backoff.delay_for(attempt);
            attempt += 1;
            tracing::warn!(
                table = %self.table,
                unprocessed = pending.len(),
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying unprocessed batch items"
            );
            sleep(delay).await;
        }

        self.written += batch_len as u64;
        Ok(())
    }

    /// Flush the tail and return the total item count written.
    async fn finish(mut self) -> Result<u64, CopyError> {
        self.flush().await?;
        Ok(self.written)
    }
}

/// Wrap an item into a put-type write request.
fn build_put_request(item: HashMap<String, AttributeValue>) -> Result<WriteRequest, CopyError> {
    let put = PutRequest::builder()
        .set_item(Some(item))
        .build()
        .map_err(|e| CopyError::Sdk(format!("failed to build put request: {e}")))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

/// Extract the write requests the service handed back as unprocessed.
fn remaining_unprocessed(
    unprocessed: Option<HashMap<String, Vec<WriteRequest>>>,
    table: &str,
) -> Vec<WriteRequest> {
    unprocessed
        .and_then(|mut by_table| by_table.remove(table))
        .unwrap_or_default()
}

/// Copy every item from `source` into `destination`.
///
/// Scan pagination: each page's `last_evaluated_key` becomes the next
/// page's `exclusive_start_key`; its absence terminates the loop.
pub async fn copy_table(
    client: &Client,
    source: &str,
    destination: &str,
    options: &CopyOptions,
) -> Result<CopyStats, CopyError> {
    let mut writer = BatchWriter::new(client, destination, options.backoff.clone());
    let mut stats = CopyStats::default();
    let mut cursor: Option<HashMap<String, AttributeValue>> = None;

    loop {
        let output = client
            .scan()
            .table_name(source)
            .set_limit(options.scan_page_limit)
            .set_exclusive_start_key(cursor.take())
            .send()
            .await
            .map_err(|err| CopyError::Sdk(sdk_error_message(&err)))?;

        let items = output.items.unwrap_or_default();
        stats.pages_scanned += 1;
        stats.items_copied += items.len() as u64;

        for item in items {
            writer.put(item).await?;
        }

        tracing::info!(
            source = %source,
            destination = %destination,
            page = stats.pages_scanned,
            items = stats.items_copied,
            "Copied scan page"
        );

        cursor = output.last_evaluated_key;
        if cursor.is_none() {
            break;
        }
    }

    let written = writer.finish().await?;
    debug_assert_eq!(written, stats.items_copied);

    tracing::info!(
        source = %source,
        destination = %destination,
        items = stats.items_copied,
        pages = stats.pages_scanned,
        "Copy complete"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> HashMap<String, AttributeValue> {
        let mut map = HashMap::new();
        map.insert("OrderId".to_string(), AttributeValue::S(id.to_string()));
        map
    }

    #[test]
    fn test_build_put_request_keeps_item() {
        let request = build_put_request(item("a-1")).unwrap();
        let put = request.put_request.unwrap();
        assert_eq!(
            put.item().get("OrderId"),
            Some(&AttributeValue::S("a-1".to_string()))
        );
    }

    #[test]
    fn test_remaining_unprocessed_for_our_table() {
        let mut by_table = HashMap::new();
        by_table.insert("dest".to_string(), vec![build_put_request(item("x")).unwrap()]);

        let remaining = remaining_unprocessed(Some(by_table), "dest");
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn test_remaining_unprocessed_ignores_other_tables() {
        let mut by_table = HashMap::new();
        by_table.insert("other".to_string(), vec![build_put_request(item("x")).unwrap()]);

        assert!(remaining_unprocessed(Some(by_table), "dest").is_empty());
        assert!(remaining_unprocessed(None, "dest").is_empty());
    }

    #[tokio::test]
    async fn test_writer_buffers_below_batch_limit() {
        // No flush happens below the limit, so no client call is made and
        // the buffered count is observable.
        let settings = crate::config::Settings::default();
        let client = crate::config::create_dynamodb_client(&settings).await;
        let mut writer = BatchWriter::new(&client, "dest", BackoffPolicy::default());

        for i in 0..MAX_BATCH_SIZE - 1 {
            writer.put(item(&format!("id-{i}"))).await.unwrap();
        }

        assert_eq!(writer.buffer.len(), MAX_BATCH_SIZE - 1);
        assert_eq!(writer.written, 0);
    }
}
