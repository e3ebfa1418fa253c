use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::trace::SpanData;
use opentelemetry_sdk::trace::SpanExporter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use url::Url;

/// Crates logging every connection or frame at `info`, only their warnings are kept
const CHATTY_TARGETS: [&str; 4] = ["h2", "hyper_util", "mongodb::connection", "tower"];

#[derive(Debug)]
pub struct Telemetry {
    pub service_name: String,
    pub endpoint: Url,
}

pub struct TracingConfig {
    /// Level of the events without a more specific directive
    pub log_level: LevelFilter,
    /// Added after the `RUST_LOG` ones
    pub directives: Vec<Directive>,
    /// Spans are exported in background batches when set
    pub telemetry: Option<Telemetry>,
}

/// A span exporter dropping every batch
///
/// `opentelemetry_sdk` ships one behind its `testing` feature, which pulls far too many
/// dependencies. Used when telemetry is disabled and in tests.
#[derive(Debug, Default)]
pub struct NoopSpanExporter;

impl SpanExporter for NoopSpanExporter {
    fn export(&self, _: Vec<SpanData>) -> impl std::future::Future<Output = OTelSdkResult> + Send {
        std::future::ready(Ok(()))
    }
}

fn env_filter(log_level: LevelFilter, directives: Vec<Directive>) -> EnvFilter {
    let quiet = CHATTY_TARGETS
        .iter()
        .filter_map(|target| format!("{target}=warn").parse::<Directive>().ok());
    quiet.chain(directives).fold(
        EnvFilter::builder()
            .with_default_directive(log_level.into())
            .from_env_lossy(),
        |filter, directive| filter.add_directive(directive),
    )
}

/// Builds the subscriber of the service: pretty logs on stdout, and spans sent to `exporter`
/// when telemetry is enabled
pub fn create_tracing_subscriber<T: SpanExporter + 'static>(
    TracingConfig {
        log_level,
        directives,
        telemetry,
    }: TracingConfig,
    exporter: T,
) -> impl tracing::Subscriber {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_file(true)
        .with_line_number(false);

    let telemetry_layer = telemetry.map(|Telemetry { service_name, .. }| {
        let provider = SdkTracerProvider::builder()
            .with_resource(
                Resource::builder()
                    .with_service_name(service_name.clone())
                    .build(),
            )
            .with_batch_exporter(exporter)
            .build();
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
        tracing_opentelemetry::OpenTelemetryLayer::new(provider.tracer(service_name))
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter(log_level, directives))
        .with(fmt_layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chatty_targets_are_capped_at_warn() {
        let filter = env_filter(LevelFilter::DEBUG, vec![]).to_string();
        for target in CHATTY_TARGETS {
            assert!(filter.contains(&format!("{target}=warn")), "{filter}");
        }
    }

    #[test]
    fn extra_directives_are_kept() {
        let directive = "blogs_models=trace".parse::<Directive>().unwrap();
        let filter = env_filter(LevelFilter::INFO, vec![directive]).to_string();
        assert!(filter.contains("blogs_models=trace"), "{filter}");
    }
}
