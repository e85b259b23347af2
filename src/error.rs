//! Error types for the copy pipeline

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Errors surfaced by the schema inspection, provisioning and copy stages.
///
/// Every variant is terminal: a failed stage aborts the run, there is no
/// partial-failure continuation. Argument-count problems are handled at the
/// clap seam and never reach this type.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("source table '{0}' does not exist or cannot be accessed")]
    SourceNotFound(String),

    #[error("invalid key schema on table '{table}': {message}")]
    Schema { table: String, message: String },

    #[error("could not provision table '{table}': {message}")]
    Provision { table: String, message: String },

    #[error("table '{table}' did not become active within {waited_secs}s")]
    ProvisionTimeout { table: String, waited_secs: u64 },

    #[error("{unprocessed} item(s) still unprocessed after {retries} retries")]
    PartialWrite { unprocessed: usize, retries: u32 },

    #[error("DynamoDB request failed: {0}")]
    Sdk(String),
}

/// Render an SDK error with its full cause chain.
///
/// `SdkError`'s own `Display` is a one-liner ("service error"); the context
/// wrapper includes the underlying service message.
pub fn sdk_error_message<E>(err: &SdkError<E>) -> String
where
    E: std::error::Error + Send + Sync + 'static,
{
    format!("{}", DisplayErrorContext(err))
}
