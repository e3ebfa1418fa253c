pub mod blogs;
mod openapi;

#[cfg(test)]
mod test_app;

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::Router;
use axum::ServiceExt;
use axum::extract::FromRef;
use axum::extract::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum_tracing_opentelemetry::middleware::OtelAxumLayer;
use blogs_models::BlogRepository;
use common::Version;
use database::DocumentStore;
use database::document_store::PingError;
use thiserror::Error;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower::Layer as _;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing::info;
use tracing::warn;

pub use openapi::OpenApiRoot;

use crate::error::BlogsError;
use crate::error::Result;

fn service_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/blogs", get(blogs::list).post(blogs::create))
        .route("/blogs/author/{user_id}", get(blogs::list_by_author))
        .route("/blogs/status/{status}", get(blogs::list_by_status))
        .route(
            "/blogs/{blog_id}",
            get(blogs::get).patch(blogs::patch).delete(blogs::delete),
        )
        .route(
            "/blogs/{blog_id}/votes",
            get(blogs::votes).post(blogs::add_vote),
        )
        .route("/blogs/{blog_id}/votes/count", get(blogs::votes_count))
        .route("/blogs/{blog_id}/votes/{index}", put(blogs::change_vote))
        .route("/blogs/{blog_id}/comments", post(blogs::add_comment))
        .route(
            "/blogs/{blog_id}/comments/{comment}",
            put(blogs::update_comment).delete(blogs::delete_comment),
        )
}

#[derive(Debug, Error)]
pub enum AppHealthError {
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Database(#[from] PingError),
}

impl BlogsError for AppHealthError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        match self {
            Self::Timeout => "blogs:app_health:Timeout",
            Self::Database(_) => "blogs:app_health:Database",
        }
    }
}

#[utoipa::path(
    get, path = "/health",
    responses(
        (status = 200, description = "Check if the service is running correctly", body = String)
    )
)]
async fn health(
    State(AppState {
        store,
        health_check_timeout,
        ..
    }): State<AppState>,
) -> Result<&'static str> {
    timeout(health_check_timeout, check_health(&store))
        .await
        .map_err(|_| AppHealthError::Timeout)??;
    Ok("ok")
}

pub async fn check_health(store: &DocumentStore) -> Result<()> {
    store.ping().await.map_err(AppHealthError::Database)?;
    Ok(())
}

#[utoipa::path(
    get, path = "/version",
    responses(
        (status = 200, description = "Return the service version", body = Version),
    ),
)]
pub(in crate::views) async fn version(
    State(AppState { config, .. }): State<AppState>,
) -> Json<Version> {
    Json(Version {
        git_describe: config.app_version.clone(),
    })
}

pub struct ServerConfig {
    pub port: u16,
    pub grpc_port: u16,
    pub address: String,
    pub health_check_timeout: Duration,
    pub allowed_origin: Option<String>,
    pub store_config: database::Config,
    pub app_version: Option<String>,
}

pub struct Server {
    app_state: AppState,
    router: NormalizePath<Router>,
}

/// The state of the whole service, available to all handlers
///
/// If only the blogs are needed, use `State<BlogRepository>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: DocumentStore,
    pub repository: BlogRepository,
    pub health_check_timeout: Duration,
}

impl FromRef<AppState> for BlogRepository {
    fn from_ref(input: &AppState) -> Self {
        input.repository.clone()
    }
}

impl AppState {
    #[tracing::instrument(skip_all, level = "info", err, name = "AppState initialization")]
    async fn init(config: ServerConfig) -> anyhow::Result<Self> {
        #[tracing::instrument(skip_all, level = "info", err, name = "Document store connection")]
        async fn connect_store(store_config: database::Config) -> anyhow::Result<DocumentStore> {
            let store = DocumentStore::new(store_config).await?;
            store.ping().await?;
            let databases = store.list_database_names().await?;
            info!(?databases, "connected to the document store");
            Ok(store)
        }
        let store = connect_store(config.store_config.clone())
            .in_current_span()
            .await?;

        Ok(Self {
            repository: BlogRepository::new(&store),
            store,
            health_check_timeout: config.health_check_timeout,
            config: Arc::new(config),
        })
    }
}

fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    Ok(match allowed_origin {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .map_err(|_| anyhow!("invalid allowed origin '{origin}'"))?,
        ),
        None => cors.allow_origin(Any),
    })
}

/// Cancels `token` on SIGINT or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "cannot listen to SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::SignalKind;
        match tokio::signal::unix::signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "cannot listen to SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => return,
    }
    info!("shutdown signal received, draining in-flight calls");
    token.cancel();
}

impl Server {
    #[tracing::instrument(skip_all, err, level = "info", name = "server initialization")]
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        info!("Building server...");
        let cors = cors_layer(config.allowed_origin.as_deref())?;
        let router = tracing::debug_span!("router initialization").in_scope(service_router);
        let app_state = AppState::init(config).await?;

        // Configure the axum router
        let router: Router<()> = router
            .layer(OtelAxumLayer::default())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());
        let normalizing_router = NormalizePathLayer::trim_trailing_slash().layer(router);

        Ok(Self {
            app_state,
            router: normalizing_router,
        })
    }

    /// Serves the REST and gRPC interfaces until SIGINT or SIGTERM, then closes the store
    pub async fn start(self) -> anyhow::Result<()> {
        let Self { app_state, router } = self;
        let ServerConfig {
            address,
            port,
            grpc_port,
            ..
        } = app_state.config.as_ref();

        let shutdown = CancellationToken::new();
        tokio::spawn(cancel_on_signal(shutdown.clone()));

        let grpc_address = tokio::net::lookup_host((address.as_str(), *grpc_port))
            .await?
            .next()
            .ok_or_else(|| anyhow!("cannot resolve address '{address}'"))?;
        let grpc = crate::grpc::serve(
            grpc_address,
            app_state.repository.clone(),
            shutdown.clone().cancelled_owned(),
        );

        info!(%address, port, "Running server...");
        let service = ServiceExt::<axum::extract::Request>::into_make_service(router);
        let listener = tokio::net::TcpListener::bind((address.as_str(), *port)).await?;
        let rest = async {
            let served = axum::serve(listener, service)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await;
            shutdown.cancel();
            served.map_err(anyhow::Error::from)
        };
        let grpc = async {
            let served = grpc.await;
            shutdown.cancel();
            served
        };

        // The first server to stop, on error or not, drains the other one
        let (rest, grpc) = tokio::join!(rest, grpc);
        app_state.store.shutdown().await;
        rest.and(grpc)
    }
}
