use clap::Args;
use clap::ValueEnum;
use common::tracing::Telemetry;
use url::Url;

/// Export of the service spans
#[derive(Args, Debug, Clone)]
pub struct TelemetryConfig {
    /// `opentelemetry` sends spans over OTLP/gRPC to `--telemetry-endpoint`
    #[arg(long, env = "BLOGS_TELEMETRY_KIND", value_enum, default_value_t)]
    pub telemetry_kind: TelemetryKind,
    /// Name the spans are reported under
    #[arg(long, env = "BLOGS_SERVICE_NAME", default_value = "blogs")]
    pub service_name: String,
    #[arg(
        long,
        env = "BLOGS_TELEMETRY_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub telemetry_endpoint: Url,
}

#[derive(Default, ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum TelemetryKind {
    #[default]
    None,
    Opentelemetry,
}

impl TelemetryConfig {
    /// The span export settings, `None` when spans are not exported
    pub fn telemetry(&self) -> Option<Telemetry> {
        match self.telemetry_kind {
            TelemetryKind::None => None,
            TelemetryKind::Opentelemetry => Some(Telemetry {
                service_name: self.service_name.clone(),
                endpoint: self.telemetry_endpoint.clone(),
            }),
        }
    }
}
