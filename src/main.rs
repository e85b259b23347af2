//! Copy one DynamoDB table into another
//!
//! Inspects the source table's key schema, creates the destination table
//! with that schema if it does not exist, then copies every item across.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dynamo_table_copy::{
    config::{self, Settings},
    copy::{self, CopyOptions},
    provision::{self, ProvisionOptions},
    schema,
};

/// Copy the contents of one DynamoDB table into another, creating the
/// destination table (with the source's key schema) if it does not exist.
#[derive(Parser, Debug)]
#[command(name = "dynamo-table-copy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source table name
    source_table: String,

    /// Destination table name
    destination_table: String,

    /// AWS region (overrides AWS_DEFAULT_REGION/AWS_REGION env vars)
    #[arg(long)]
    region: Option<String>,

    /// DynamoDB endpoint URL (for DynamoDB Local / LocalStack)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Provision the destination table but skip the data copy
    /// (same effect as setting DISABLE_DATACOPY)
    #[arg(long)]
    skip_copy: bool,

    /// Seconds to wait for a freshly created table to become active
    #[arg(long)]
    provision_timeout: Option<u64>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load .env file if it exists (before both clap env lookups and settings)
    dotenvy::dotenv().ok();

    // clap exits 2 on bad usage by default; this tool's contract is usage
    // text on stdout and exit 1. Help and version requests are not usage
    // errors and still exit 0.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            println!("{err}");
            std::process::exit(parse_error_exit_code(err.kind()));
        }
    };

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    // Override settings with CLI arguments
    if let Some(region) = args.region.clone() {
        settings.aws_region = region;
    }
    if let Some(endpoint_url) = args.endpoint_url.clone() {
        settings.dynamodb_endpoint_url = Some(endpoint_url);
    }
    if args.skip_copy {
        settings.skip_data_copy = true;
    }
    if let Some(timeout) = args.provision_timeout {
        settings.provision_timeout_seconds = timeout;
    }
    if let Some(log_level) = args.log_level.clone() {
        settings.log_level = log_level;
    }
    if let Err(err) = settings.validate() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }

    init_tracing(&settings.log_level);

    if let Err(err) = run(&args, &settings).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

/// Run the three-stage pipeline: inspect, provision, copy.
async fn run(args: &Args, settings: &Settings) -> Result<()> {
    tracing::info!(
        source = %args.source_table,
        destination = %args.destination_table,
        region = %settings.aws_region,
        "Starting table copy"
    );

    let client = config::create_dynamodb_client(settings).await;

    let key_schema = schema::inspect(&client, &args.source_table).await?;

    let provision_options = ProvisionOptions {
        timeout: Duration::from_secs(settings.provision_timeout_seconds),
        ..ProvisionOptions::default()
    };
    let outcome = provision::ensure_table(
        &client,
        &args.destination_table,
        &key_schema,
        &provision_options,
    )
    .await?;

    if outcome == provision::ProvisionOutcome::AlreadyExists {
        println!(
            "Table {} already exists. Skipping creation.",
            args.destination_table
        );
    }

    if settings.skip_data_copy {
        tracing::info!("Data copy disabled, stopping after provisioning");
        return Ok(());
    }

    let copy_options = CopyOptions {
        scan_page_limit: settings.scan_page_limit,
        ..CopyOptions::default()
    };
    copy::copy_table(
        &client,
        &args.source_table,
        &args.destination_table,
        &copy_options,
    )
    .await?;

    println!("Data copy completed successfully.");

    Ok(())
}

/// Exit code for a failed argument parse: 0 for help/version requests,
/// 1 for genuine usage errors.
fn parse_error_exit_code(kind: clap::error::ErrorKind) -> i32 {
    match kind {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Initialize tracing subscriber with the specified log level
fn init_tracing(log_level: &str) {
    // RUST_LOG wins over the settings-provided level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positional_args_parse() {
        let args = Args::try_parse_from(["dynamo-table-copy", "Orders", "OrdersBackup"]).unwrap();
        assert_eq!(args.source_table, "Orders");
        assert_eq!(args.destination_table, "OrdersBackup");
        assert!(!args.skip_copy);
        assert!(args.region.is_none());
    }

    #[test]
    fn test_missing_args_rejected() {
        assert!(Args::try_parse_from(["dynamo-table-copy"]).is_err());
        assert!(Args::try_parse_from(["dynamo-table-copy", "Orders"]).is_err());
    }

    #[test]
    fn test_missing_args_exit_with_failure() {
        let err = Args::try_parse_from(["dynamo-table-copy"]).unwrap_err();
        assert_eq!(parse_error_exit_code(err.kind()), 1);

        let err = Args::try_parse_from(["dynamo-table-copy", "a", "b", "c"]).unwrap_err();
        assert_eq!(parse_error_exit_code(err.kind()), 1);
    }

    #[test]
    fn test_help_and_version_exit_cleanly() {
        let err = Args::try_parse_from(["dynamo-table-copy", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(err.kind()), 0);

        let err = Args::try_parse_from(["dynamo-table-copy", "--version"]).unwrap_err();
        assert_eq!(parse_error_exit_code(err.kind()), 0);
    }

    #[test]
    fn test_extra_args_rejected() {
        assert!(Args::try_parse_from(["dynamo-table-copy", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_flags_parse() {
        let args = Args::try_parse_from([
            "dynamo-table-copy",
            "Orders",
            "OrdersBackup",
            "--region",
            "eu-west-1",
            "--skip-copy",
            "--provision-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        assert!(args.skip_copy);
        assert_eq!(args.provision_timeout, Some(60));
    }
}
