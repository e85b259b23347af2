//! Table provisioning
//!
//! Ensures the destination table exists with the source's inferred key
//! schema, creating it if missing and waiting for it to become active.
//! A pre-existing destination is left untouched, even if its schema
//! differs from the source's.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, TableStatus,
};
use aws_sdk_dynamodb::Client;
use tokio::time::{sleep, Instant};

use crate::error::{sdk_error_message, CopyError};
use crate::schema::KeySchema;

/// How the destination table came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Table was created by this run and is now active
    Created,
    /// Table already existed; its schema was not verified
    AlreadyExists,
}

/// Knobs for the readiness wait after CreateTable.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Deadline for the table to reach ACTIVE
    pub timeout: Duration,

    /// Pause between DescribeTable polls
    pub poll_interval: Duration,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Ensure the destination table exists and is ready for writes.
///
/// Existence is checked with DescribeTable:
/// - success: no-op, the table is taken as-is
/// - `ResourceNotFoundException`: create with the inferred key schema and
///   on-demand billing, then wait until ACTIVE (bounded by
///   `options.timeout`)
/// - any other error is fatal ([`CopyError::Provision`])
pub async fn ensure_table(
    client: &Client,
    table: &str,
    schema: &KeySchema,
    options: &ProvisionOptions,
) -> Result<ProvisionOutcome, CopyError> {
    match client.describe_table().table_name(table).send().await {
        Ok(_) => {
            tracing::info!(table = %table, "Destination table already exists, skipping creation");
            return Ok(ProvisionOutcome::AlreadyExists);
        }
        Err(err) => {
            let not_found = err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false);
            if !not_found {
                return Err(CopyError::Provision {
                    table: table.to_string(),
                    message: sdk_error_message(&err),
                });
            }
        }
    }

    create_table(client, table, schema).await?;
    wait_until_active(client, table, options).await?;

    tracing::info!(table = %table, "Destination table created and active");
    Ok(ProvisionOutcome::Created)
}

/// Issue the CreateTable request with on-demand billing.
async fn create_table(client: &Client, table: &str, schema: &KeySchema) -> Result<(), CopyError> {
    let provision_err = |message: String| CopyError::Provision {
        table: table.to_string(),
        message,
    };

    let mut request = client
        .create_table()
        .table_name(table)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(&schema.partition_key.name)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| provision_err(e.to_string()))?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(&schema.partition_key.name)
                .attribute_type(schema.partition_key.attribute_type.clone())
                .build()
                .map_err(|e| provision_err(e.to_string()))?,
        );

    if let Some(sort_key) = &schema.sort_key {
        request = request
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(&sort_key.name)
                    .key_type(KeyType::Range)
                    .build()
                    .map_err(|e| provision_err(e.to_string()))?,
            )
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&sort_key.name)
                    .attribute_type(sort_key.attribute_type.clone())
                    .build()
                    .map_err(|e| provision_err(e.to_string()))?,
            );
    }

    request
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|err| provision_err(sdk_error_message(&err)))?;

    tracing::info!(
        table = %table,
        partition_key = %schema.partition_key.name,
        sort_key = schema.sort_key.as_ref().map(|k| k.name.as_str()),
        "Issued CreateTable"
    );

    Ok(())
}

/// Poll DescribeTable until the table reports ACTIVE, bounded by the
/// configured deadline.
///
/// A `ResourceNotFoundException` right after CreateTable is treated as
/// not-ready-yet rather than an error; table metadata is eventually
/// consistent.
async fn wait_until_active(
    client: &Client,
    table: &str,
    options: &ProvisionOptions,
) -> Result<(), CopyError> {
    let started = Instant::now();

    loop {
        match client.describe_table().table_name(table).send().await {
            Ok(output) => {
                let status = output.table.and_then(|t| t.table_status);
                if status == Some(TableStatus::Active) {
                    return Ok(());
                }
                tracing::debug!(
                    table = %table,
                    status = status.as_ref().map(|s| s.as_str()),
                    "Waiting for table to become active"
                );
            }
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_resource_not_found_exception())
                    .unwrap_or(false);
                if !not_found {
                    return Err(CopyError::Provision {
                        table: table.to_string(),
                        message: sdk_error_message(&err),
                    });
                }
            }
        }

        if started.elapsed() >= options.timeout {
            return Err(CopyError::ProvisionTimeout {
                table: table.to_string(),
                waited_secs: options.timeout.as_secs(),
            });
        }

        sleep(options.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ProvisionOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(300));
        assert_eq!(options.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_outcome_equality() {
        assert_eq!(ProvisionOutcome::Created, ProvisionOutcome::Created);
        assert_ne!(ProvisionOutcome::Created, ProvisionOutcome::AlreadyExists);
    }
}
