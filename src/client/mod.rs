pub mod healthcheck;
mod mongo_config;
pub mod runserver;
mod telemetry_config;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
pub use mongo_config::MongoConfig;
use runserver::RunserverArgs;
pub use telemetry_config::TelemetryConfig;

use crate::views::OpenApiRoot;

#[derive(Parser, Debug)]
#[command(author, version)]
pub struct Client {
    #[command(flatten)]
    pub mongo_config: MongoConfig,
    #[command(flatten)]
    pub telemetry_config: TelemetryConfig,
    #[arg(long, env, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    /// Version reported by the `/version` endpoint, always provide in production
    #[clap(long, env = "BLOGS_GIT_DESCRIBE")]
    pub app_version: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum Color {
    Never,
    Always,
    #[default]
    Auto,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Runserver(Box<RunserverArgs>), // suppresses clippy lint about variant size
    #[command(about, long_about = "Prints the OpenApi of the REST service")]
    Openapi,
    #[command(about, long_about = "Healthcheck")]
    Healthcheck,
}

/// Prints the OpenApi to stdout
pub fn print_openapi() -> anyhow::Result<()> {
    let openapi = OpenApiRoot::build_openapi();
    print!("{}", serde_yaml::to_string(&openapi)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Client::command().debug_assert();
    }

    #[test]
    fn runserver_defaults() {
        let client = Client::parse_from(["blogs", "runserver"]);
        let Commands::Runserver(args) = client.command else {
            panic!("expected the runserver command");
        };
        let args = format!("{args:?}");
        assert!(args.contains("grpc_port: 8000"));
        assert!(args.contains("port: 8090"));
        let color = client.color.to_possible_value().map(|v| v.get_name().to_owned());
        assert_eq!(color.as_deref(), Some("auto"));
    }
}
