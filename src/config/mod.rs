//! Configuration module
//!
//! Environment-driven settings and AWS client construction.

pub mod aws;
pub mod settings;

pub use aws::create_dynamodb_client;
pub use settings::Settings;
