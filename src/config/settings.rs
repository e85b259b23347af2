//! Application settings and configuration
//!
//! Settings are loaded from environment variables with sensible defaults
//! (`AWS_DEFAULT_REGION`, `DISABLE_DATACOPY`, `PROVISION_TIMEOUT_SECONDS`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Region used when neither `AWS_DEFAULT_REGION` nor `AWS_REGION` is set.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Default deadline for the destination table to become active, in seconds.
pub const DEFAULT_PROVISION_TIMEOUT_SECONDS: u64 = 300;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// AWS region for both source and destination tables
    pub aws_region: String,

    /// Custom DynamoDB endpoint (DynamoDB Local, LocalStack)
    pub dynamodb_endpoint_url: Option<String>,

    /// Skip the data-copy stage; provisioning still runs.
    ///
    /// Driven by the presence of `DISABLE_DATACOPY` (any value, including
    /// empty, counts as set).
    pub skip_data_copy: bool,

    /// Default log level when RUST_LOG is unset
    pub log_level: String,

    /// Deadline for a freshly created destination table to become active
    pub provision_timeout_seconds: u64,

    /// Optional per-page item cap forwarded to Scan.
    ///
    /// Unset means the service default. Mainly useful against DynamoDB Local
    /// to exercise pagination with small tables.
    pub scan_page_limit: Option<i32>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        let settings = Self {
            aws_region: env::var("AWS_DEFAULT_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| DEFAULT_REGION.to_string()),

            dynamodb_endpoint_url: env::var("DYNAMODB_ENDPOINT_URL").ok(),

            // Presence check, not a boolean parse: DISABLE_DATACOPY= counts.
            skip_data_copy: env_flag_present("DISABLE_DATACOPY"),

            log_level: env_or_default("LOG_LEVEL", "info"),

            provision_timeout_seconds: env_or_default(
                "PROVISION_TIMEOUT_SECONDS",
                &DEFAULT_PROVISION_TIMEOUT_SECONDS.to_string(),
            )
            .parse()
            .context("Invalid PROVISION_TIMEOUT_SECONDS value")?,

            scan_page_limit: match env::var("SCAN_PAGE_LIMIT") {
                Ok(raw) => Some(raw.parse().context("Invalid SCAN_PAGE_LIMIT value")?),
                Err(_) => None,
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.aws_region.is_empty() {
            anyhow::bail!("AWS region cannot be empty");
        }

        if self.provision_timeout_seconds == 0 {
            anyhow::bail!("Provision timeout must be > 0");
        }

        if let Some(limit) = self.scan_page_limit {
            if limit <= 0 {
                anyhow::bail!("Scan page limit must be > 0");
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws_region: DEFAULT_REGION.to_string(),
            dynamodb_endpoint_url: None,
            skip_data_copy: false,
            log_level: "info".to_string(),
            provision_timeout_seconds: DEFAULT_PROVISION_TIMEOUT_SECONDS,
            scan_page_limit: None,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// True if the variable is set at all, even to the empty string.
fn env_flag_present(key: &str) -> bool {
    env::var_os(key).is_some()
}
