//! HTTP front end of the quote server.

pub mod pipeline;

use crate::core::config::{AppConfig, ResponseBody, StoreKind};
use crate::core::store::QuoteStore;
use crate::providers::awesome_api::AwesomeApiProvider;
use crate::store::memory::MemoryStore;
use crate::store::sqlite::SqliteStore;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use pipeline::QuotePipeline;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Reports whether the quote behind a 200 response was stored.
pub const PERSIST_STATUS_HEADER: HeaderName = HeaderName::from_static("x-persist-status");

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<QuotePipeline>,
    respond_with: ResponseBody,
}

impl AppState {
    pub fn new(pipeline: QuotePipeline, respond_with: ResponseBody) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            respond_with,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cotacao", get(quote))
        .route("/quote", get(quote))
        .with_state(state)
}

async fn quote(State(state): State<AppState>) -> Response {
    let outcome = match state.pipeline.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Quote request failed");
            let body = ErrorBody {
                error: e.to_string(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let persist_status = outcome.persist_status();
    info!(bid = %outcome.quote.bid, persist_status, "Quote served");

    let mut response = match state.respond_with {
        ResponseBody::Bid => Json(outcome.quote.bid).into_response(),
        ResponseBody::Quote => Json(outcome.quote).into_response(),
    };
    response.headers_mut().insert(
        PERSIST_STATUS_HEADER,
        HeaderValue::from_static(persist_status),
    );
    response
}

/// Builds the store and rate source from `config` and serves until Ctrl-C
/// or SIGTERM.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let store: Arc<dyn QuoteStore> = match config.store.kind {
        StoreKind::Sqlite => Arc::new(SqliteStore::open(&config.store.path).await?),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    let provider = Arc::new(AwesomeApiProvider::new(
        &config.source.base_url,
        &config.source.pair,
    )?);
    let pipeline = QuotePipeline::new(
        provider,
        store,
        config.server.fetch_timeout(),
        config.server.persist_timeout(),
    );
    let state = AppState::new(pipeline, config.server.respond_with);

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!(
        addr = %listener.local_addr()?,
        fetch_timeout = ?config.server.fetch_timeout(),
        persist_timeout = ?config.server.persist_timeout(),
        "Quote server listening"
    );

    serve_on(listener, state, shutdown_signal()).await
}

/// Serves the quote routes on an already bound listener until `shutdown`
/// resolves.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Quote server failed")
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let mut term =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = term.recv() => {},
    }

    #[cfg(not(unix))]
    let _ = ctrl_c.await;

    info!("Shutdown signal received");
}
