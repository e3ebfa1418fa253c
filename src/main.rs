mod client;
mod error;
mod grpc;
mod views;

use std::process::exit;

use clap::Parser;
use client::Client;
use client::Color;
use client::Commands;
use client::healthcheck::healthcheck_cmd;
use client::print_openapi;
use client::runserver::runserver;
use colored::Colorize;
use common::tracing::NoopSpanExporter;
use common::tracing::Telemetry;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use opentelemetry_otlp::WithExportConfig;
use tracing::error;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(_) => (),
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.to_string().red());
            exit(2);
        }
    }
}

fn init_tracing(client: &Client) -> anyhow::Result<()> {
    // The OpenAPI is printed to stdout, keep it free of log lines
    if matches!(client.command, Commands::Openapi) {
        return Ok(());
    }

    let tracing_config = TracingConfig {
        log_level: tracing_subscriber::filter::LevelFilter::INFO,
        directives: vec![],
        telemetry: client.telemetry_config.telemetry(),
    };

    let endpoint = tracing_config
        .telemetry
        .as_ref()
        .map(|Telemetry { endpoint, .. }| endpoint.clone());
    if let Some(endpoint) = endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .build()?;
        tracing::subscriber::set_global_default(create_tracing_subscriber(
            tracing_config,
            exporter,
        ))?;
    } else {
        tracing::subscriber::set_global_default(create_tracing_subscriber(
            tracing_config,
            NoopSpanExporter,
        ))?;
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let client = Client::parse();
    init_tracing(&client)?;

    match client.color {
        Color::Never => colored::control::set_override(false),
        Color::Always => colored::control::set_override(true),
        Color::Auto => colored::control::unset_override(),
    }

    match client.command {
        Commands::Runserver(args) => {
            runserver(*args, client.mongo_config, client.app_version).await
        }
        Commands::Openapi => print_openapi(),
        Commands::Healthcheck => healthcheck_cmd(client.mongo_config).await,
    }
}
