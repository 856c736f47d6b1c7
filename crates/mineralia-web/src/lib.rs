use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, middleware, routing::get};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use mineralia_core::{Catalog, SqliteCatalogStore};

mod dto;
mod error;
mod handlers;
mod security;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) catalog: Arc<Catalog<SqliteCatalogStore>>,
}

impl WebState {
    fn new(catalog: Catalog<SqliteCatalogStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

/// Start the catalog API server and block until shutdown.
///
/// # Errors
/// Returns an error when the runtime cannot be created, the socket cannot be
/// bound, or the server exits with a runtime failure.
pub fn serve_web(catalog: Catalog<SqliteCatalogStore>, host: &str, port: u16) -> Result<()> {
    let state = WebState::new(catalog);
    let bind_addr = format!("{host}:{port}");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build web runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind web server at {bind_addr}"))?;
        tracing::info!(addr = %listener.local_addr()?, "catalog api listening");

        axum::serve(listener, app_router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("web server failed")
    })
}

pub(crate) fn app_router(state: WebState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/minerals", get(handlers::list_minerals))
        .route("/api/minerals/{id}", get(handlers::mineral_detail))
        .route(
            "/api/minerals/{id}/classification",
            get(handlers::mineral_classification),
        )
        .route("/api/minerals/{id}/statuses", get(handlers::mineral_statuses))
        .route(
            "/api/minerals/{id}/statistics",
            get(handlers::mineral_statistics),
        )
        .route("/api/statistics/statuses", get(handlers::status_counts))
        .route(
            "/api/statistics/discovery-years",
            get(handlers::discovery_year_counts),
        )
        .route(
            "/api/statistics/discovery-countries",
            get(handlers::discovery_country_counts),
        )
        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn(security::security_headers_middleware))
        // Request spans share the level of the catalog request log.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
