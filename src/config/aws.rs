//! AWS SDK configuration
//!
//! Builds the DynamoDB client from settings, with support for custom
//! endpoints (DynamoDB Local, LocalStack). The client is constructed once
//! and passed by reference into each pipeline stage; there are no global
//! service handles.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::Client as DynamoDbClient;

use crate::config::Settings;

/// Build the base AWS SDK configuration.
///
/// Uses the region from settings, falling back to the SDK's default
/// provider chain, and the default credential chain (env vars, profile,
/// instance metadata).
pub async fn build_sdk_config(settings: &Settings) -> SdkConfig {
    let region_provider =
        RegionProviderChain::first_try(Region::new(settings.aws_region.clone()))
            .or_default_provider();

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Create a DynamoDB client with optional custom endpoint.
///
/// If `DYNAMODB_ENDPOINT_URL` is set in settings, the client targets that
/// endpoint instead of the regional one.
pub async fn create_dynamodb_client(settings: &Settings) -> DynamoDbClient {
    let sdk_config = build_sdk_config(settings).await;

    if let Some(endpoint_url) = &settings.dynamodb_endpoint_url {
        tracing::info!(endpoint = %endpoint_url, "Using custom DynamoDB endpoint");

        let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .build();

        DynamoDbClient::from_conf(dynamodb_config)
    } else {
        DynamoDbClient::new(&sdk_config)
    }
}
