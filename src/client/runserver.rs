use std::time::Duration;

use clap::Args;

use crate::views;

use super::MongoConfig;

#[derive(Args, Debug)]
#[command(about, long_about = "Launch the REST and gRPC servers")]
pub struct RunserverArgs {
    #[arg(long, env = "BLOGS_GRPC_PORT", default_value_t = 8000)]
    grpc_port: u16,
    #[arg(long, env = "BLOGS_PORT", default_value_t = 8090)]
    port: u16,
    #[arg(long, env = "BLOGS_ADDRESS", default_value_t = String::from("0.0.0.0"))]
    address: String,
    /// Only origin allowed to make cross-origin REST requests, any origin is allowed if unset
    #[arg(long, env = "BLOGS_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,
    /// The timeout to use when performing the healthcheck, in milliseconds
    #[clap(long, env = "BLOGS_HEALTH_CHECK_TIMEOUT_MS", default_value_t = 1000)]
    health_check_timeout_ms: u64,
}

/// Create and run the server
pub async fn runserver(
    RunserverArgs {
        grpc_port,
        port,
        address,
        allowed_origin,
        health_check_timeout_ms,
    }: RunserverArgs,
    mongo_config: MongoConfig,
    app_version: Option<String>,
) -> anyhow::Result<()> {
    let config = views::ServerConfig {
        port,
        grpc_port,
        address,
        health_check_timeout: Duration::from_millis(health_check_timeout_ms),
        allowed_origin,
        store_config: mongo_config.into_store_config(),
        app_version,
    };

    let server = views::Server::new(config).await?;
    server.start().await
}
