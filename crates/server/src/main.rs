use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError},
        rejection::BytesRejection,
        DefaultBodyLimit, FromRequest, Request, State,
    },
    http::{header, StatusCode},
    routing::{get, get_service, post},
    Json, Router,
};
use serde_json::Value;
use server_api::{
    fields::{is_multipart, payload_from_pairs, Payload},
    load_feed, submit_contact, submit_todo, submit_todo_fields,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{FailureResponse, FeedErrorResponse, SubmitResponse, TodoResponse},
};
use storage::MongoStore;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

type Failure = (StatusCode, Json<FailureResponse>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    if settings.mongodb_uri.is_none() {
        warn!("MONGODB_URI is not set; submissions will fail until it is configured");
    }
    let store = MongoStore::new(settings.mongodb_uri.clone(), settings.db_name.clone());
    let state = AppState::new(&settings, Arc::new(store));
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind(settings.bind_addr()).await?;
    let addr = listener.local_addr()?;
    info!(
        %addr,
        static_dir = %settings.static_dir.display(),
        feed = %settings.feed_path.display(),
        "server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api", get(feed))
        .route("/submit", post(submit))
        .route("/submittodoitem", post(submit_todo_item))
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join("index.html"))),
        )
        .route(
            "/success",
            get_service(ServeFile::new(static_dir.join("success.html"))),
        )
        .nest_service("/static", ServeDir::new(&static_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn feed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<FeedErrorResponse>)> {
    load_feed(&state.api).await.map(Json).map_err(|e| {
        error!(path = %state.api.feed_path.display(), error = %e.message, "feed unavailable");
        (status_for(e.code), Json(FeedErrorResponse::from(e)))
    })
}

async fn submit(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), Failure> {
    let body = body.map_err(|e| body_failure(e.status(), e.body_text()))?;
    let id = submit_contact(&state.api, &body).await.map_err(failure)?;
    Ok((StatusCode::CREATED, Json(SubmitResponse::new(id))))
}

async fn submit_todo_item(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<TodoResponse>), Failure> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let id = if is_multipart(content_type.as_deref()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| body_failure(e.status(), e.body_text()))?;
        let payload = multipart_fields(multipart).await?;
        submit_todo_fields(&state.api, payload).await
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| body_failure(e.status(), e.body_text()))?;
        submit_todo(&state.api, content_type.as_deref(), &body).await
    }
    .map_err(failure)?;

    Ok((StatusCode::CREATED, Json(TodoResponse::new(id))))
}

/// Text fields of a multipart body. File parts are skipped.
async fn multipart_fields(mut multipart: Multipart) -> Result<Payload, Failure> {
    let mut pairs = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await.map_err(multipart_failure)?;
        pairs.push((name, value));
    }
    Ok(payload_from_pairs(pairs))
}

fn multipart_failure(err: MultipartError) -> Failure {
    body_failure(err.status(), err.body_text())
}

fn status_for(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn failure(err: ApiError) -> Failure {
    if err.code.is_client_error() {
        warn!(code = ?err.code, message = %err.message, "submission rejected");
    } else {
        error!(code = ?err.code, message = %err.message, "submission failed");
    }
    (status_for(err.code), Json(FailureResponse::from(err)))
}

/// The body could not be read at all, e.g. it exceeds the size limit.
fn body_failure(status: StatusCode, message: String) -> Failure {
    warn!(%status, %message, "request body rejected");
    (
        status,
        Json(FailureResponse {
            success: false,
            error: message,
        }),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(error) => {
                error!(%error, "failed to install terminate handler");
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

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
