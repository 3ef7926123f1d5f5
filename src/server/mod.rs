#![allow(clippy::result_large_err)] // Server helpers return AppError for consistent diagnostics.

use crate::core::config::SettingsSource;
use crate::core::error::AppError;
use crate::core::launch::launch_pipeline;
use crate::core::types::{ErrorCategory, LaunchEnvelope};
use axum::{
    body::Body,
    extract::Extension,
    http::{header, HeaderValue, Response, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::util::MapResponseLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// `POST /launch` takes no body; anything larger than this is refused.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// State shared across requests.
pub struct ServerState {
    settings: SettingsSource,
    http: reqwest::Client,
}

impl ServerState {
    pub fn new(settings: SettingsSource) -> Self {
        ServerState {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the HTTP surface: home page, launch endpoint and health probe.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/launch", post(handle_launch))
        .route("/healthz", get(handle_health))
        .layer(Extension(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(MapResponseLayer::new(|mut response: Response<Body>| {
            if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
                let body = json!({
                    "success": false,
                    "message": "payload too large"
                })
                .to_string();
                *response.body_mut() = Body::from(body);
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
            }
            response
        }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Bind the listener and serve until Ctrl-C or SIGTERM.
pub async fn serve(bind_addr: SocketAddr, state: ServerState) -> Result<(), AppError> {
    serve_internal(bind_addr, state, None, shutdown_signal()).await
}

/// Serve and report the bound address once known (test helper).
pub async fn serve_with_ready_notifier(
    bind_addr: SocketAddr,
    state: ServerState,
    ready_notifier: oneshot::Sender<SocketAddr>,
) -> Result<(), AppError> {
    serve_internal(bind_addr, state, Some(ready_notifier), shutdown_signal()).await
}

async fn serve_internal<F>(
    bind_addr: SocketAddr,
    state: ServerState,
    ready_notifier: Option<oneshot::Sender<SocketAddr>>,
    shutdown: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = router(Arc::new(state));
    let listener = TcpListener::bind(bind_addr).await.map_err(|err| {
        AppError::new(
            ErrorCategory::IoError,
            format!("failed to bind listener {}: {}", bind_addr, err),
        )
    })?;
    let local_addr = listener.local_addr().map_err(|err| {
        AppError::new(
            ErrorCategory::IoError,
            format!("failed to determine listener address: {}", err),
        )
    })?;
    if let Some(tx) = ready_notifier {
        let _ = tx.send(local_addr);
    }
    info!("Starting server for Studios Launch Page on {}", local_addr);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| {
            AppError::new(
                ErrorCategory::InternalError,
                format!("server terminated: {}", err),
            )
            .with_context(local_addr.to_string())
        })?;
    info!("Shutting down server for Studios Launch Page");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn handle_home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_launch(
    Extension(state): Extension<Arc<ServerState>>,
) -> Result<Json<LaunchEnvelope>, LaunchRejection> {
    let settings = state.settings.snapshot();
    let outcome = launch_pipeline(&settings, &state.http)
        .await
        .map_err(LaunchRejection::from)?;
    Ok(Json(LaunchEnvelope::launched(outcome.data, outcome.run_url)))
}

struct LaunchRejection {
    status: StatusCode,
    message: String,
}

impl From<AppError> for LaunchRejection {
    fn from(err: AppError) -> Self {
        match err.category {
            ErrorCategory::ConfigurationError => tracing::warn!("launch rejected: {}", err),
            _ => tracing::error!("launch failed: {}", err),
        }
        LaunchRejection {
            status: err.http_status(),
            message: err.message,
        }
    }
}

impl IntoResponse for LaunchRejection {
    fn into_response(self) -> Response<Body> {
        let mut resp = Json(LaunchEnvelope::failed(self.message)).into_response();
        *resp.status_mut() = self.status;
        resp
    }
}
