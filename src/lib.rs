//! DynamoDB table copy library
//!
//! Three-stage pipeline: inspect the source table's key schema, provision
//! the destination table if absent, then copy every item across.

// Public modules
pub mod config;
pub mod copy;
pub mod error;
pub mod provision;
pub mod retry;
pub mod schema;

// Re-export commonly used types
pub use config::Settings;
pub use copy::{CopyOptions, CopyStats};
pub use error::CopyError;
pub use provision::{ProvisionOptions, ProvisionOutcome};
pub use schema::KeySchema;
