//! Exposes [TestApp] and [TestAppBuilder] to ease the setup of the
//! test axum server over an in-memory document store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestRequest;
use axum_test::TestServer;
use axum_tracing_opentelemetry::middleware::OtelAxumLayer;
use blogs_models::BlogRepository;
use common::tracing::NoopSpanExporter;
use common::tracing::Telemetry;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use database::DocumentStore;
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use url::Url;

use super::AppState;
use super::ServerConfig;
use super::service_router;

/// A builder interface for [TestApp]
///
/// Use [TestAppBuilder::default_app] to get a default app over an empty in-memory store.
pub(crate) struct TestAppBuilder {
    app_version: Option<String>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self { app_version: None }
    }

    pub fn app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    pub fn default_app() -> TestApp {
        TestAppBuilder::new().build()
    }

    pub fn build(self) -> TestApp {
        let store = DocumentStore::for_tests();

        // Generate test server config
        let config = ServerConfig {
            port: 0,
            grpc_port: 0,
            address: String::default(),
            health_check_timeout: Duration::from_millis(500),
            allowed_origin: None,
            store_config: database::Config::InMemory {
                database: store.database().to_owned(),
            },
            app_version: self.app_version,
        };

        // Spans go through the OpenTelemetry layer and are dropped by the exporter
        let tracing_config = TracingConfig {
            log_level: tracing_subscriber::filter::LevelFilter::TRACE,
            directives: vec![],
            telemetry: Some(Telemetry {
                service_name: "blogs".into(),
                endpoint: Url::parse("http://localhost:4317").expect("endpoint should be valid"),
            }),
        };
        let sub = create_tracing_subscriber(tracing_config, NoopSpanExporter);
        let tracing_guard = tracing::subscriber::set_default(sub);

        let app_state = AppState {
            repository: BlogRepository::new(&store),
            store,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        };

        // Configure the axum router
        let router: Router<()> = service_router()
            .layer(OtelAxumLayer::default())
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());

        // Run server
        let server = TestServer::new(router).expect("test server should build properly");

        TestApp {
            server,
            app_state,
            tracing_guard,
        }
    }
}

/// Wraps an underlying, fully configured, axum service
///
/// It also holds the store the service works on, accessible through the [TestApp] methods.
pub(crate) struct TestApp {
    server: TestServer,
    app_state: AppState,
    #[expect(unused)] // included here to extend its lifetime, not meant to be used in any way
    tracing_guard: tracing::subscriber::DefaultGuard,
}

impl TestApp {
    pub fn repository(&self) -> BlogRepository {
        self.app_state.repository.clone()
    }

    pub async fn fetch(&self, req: TestRequest) -> TestResponse {
        tracing::trace!(request = ?req);
        let response = req.await;
        TestResponse::new(response)
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.server.get(&trim_path(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.server.post(&trim_path(path))
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.server.put(&trim_path(path))
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        self.server.patch(&trim_path(path))
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.server.delete(&trim_path(path))
    }
}

// The normalizing layer wraps the whole router and cannot be set up on the test server.
// Test paths are under our control, trimming them here is enough.
fn trim_path(path: &str) -> String {
    if let Some(path) = path.strip_suffix('/') {
        path.to_owned()
    } else if path.contains("/?") {
        path.replace("/?", "?")
    } else {
        path.to_owned()
    }
}

pub struct TestResponse {
    inner: axum_test::TestResponse,
}

impl TestResponse {
    #[tracing::instrument(name = "Response", level = "debug", skip(inner), fields(status = ?inner.status_code()))]
    fn new(inner: axum_test::TestResponse) -> Self {
        tracing::trace!(response = ?inner);
        Self { inner }
    }

    #[track_caller]
    fn render_response_lossy(self) -> String {
        let bytes = self.inner.into_bytes();
        serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned())
    }

    #[track_caller]
    pub fn assert_status(self, expected_status: axum::http::StatusCode) -> Self {
        let actual_status = self.inner.status_code();
        if actual_status != expected_status {
            let body = self.render_response_lossy();
            pretty_assertions::assert_eq!(
                actual_status,
                expected_status,
                "unexpected status code body={body}"
            );
            unreachable!("should have already panicked")
        } else {
            self
        }
    }

    pub fn bytes(self) -> Vec<u8> {
        self.inner.into_bytes().into()
    }

    #[tracing::instrument(
        name = "Deserialization",
        level = "debug",
        skip(self),
        fields(response_status = ?self.inner.status_code())
    )]
    #[track_caller]
    pub fn json_into<T: DeserializeOwned>(self) -> T {
        let body = self.bytes();
        serde_json::from_slice(body.as_ref()).unwrap_or_else(|err| {
            tracing::error!(error = ?err, body = %String::from_utf8_lossy(&body), "Error deserializing test response into the desired type");
            panic!("could not deserialize test response");
        })
    }
}
