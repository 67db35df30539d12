// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use plexus_config::model::GatewayConfig;
use plexus_core::PlexusError;
use plexus_engine::Engine;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::registry::SessionRegistry;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<Engine>,
    /// The same registry the engine's dispatcher publishes through.
    pub registry: Arc<SessionRegistry>,
    /// Prometheus text renderer; `/metrics` is 404 without one.
    pub metrics_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl GatewayState {
    pub fn new(engine: Arc<Engine>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            engine,
            registry,
            metrics_render: None,
        }
    }

    pub fn with_metrics(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.metrics_render = Some(render);
        self
    }
}

/// Every gateway route over `state`.
pub fn router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/v1/connections", post(handlers::post_connection))
        .route("/v1/connections/pending", get(handlers::get_pending_connections))
        .route("/v1/connections/status/{user_id}", get(handlers::get_connection_status))
        .route("/v1/connections/{id}/accept", post(handlers::post_accept_connection))
        .route("/v1/connections/{id}/reject", post(handlers::post_reject_connection))
        .route("/v1/posts", post(handlers::post_post))
        .route("/v1/posts/{id}", get(handlers::get_post).patch(handlers::patch_post))
        .route("/v1/feed", get(handlers::get_feed))
        .route(
            "/v1/content/{id}/likes",
            get(handlers::get_like_count)
                .post(handlers::post_like)
                .delete(handlers::delete_like),
        )
        .route("/v1/content/{id}/comments", post(handlers::post_comment))
        .route("/v1/broadcasts", post(handlers::post_broadcast))
        .route("/v1/broadcasts/{id}/publish", post(handlers::post_publish))
        .route("/v1/receipts", post(handlers::post_receipt))
        .route("/v1/receipts/unread", get(handlers::get_unread_broadcasts))
        .route("/v1/messages", post(handlers::post_message))
        .route("/v1/notifications", get(handlers::get_notifications))
        .route("/v1/notifications/unread-count", get(handlers::get_unread_notifications))
        .route("/v1/notifications/read-all", post(handlers::post_read_all))
        .route("/v1/notifications/{id}/read", post(handlers::post_notification_read));

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/ws", get(ws::ws_handler))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), PlexusError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PlexusError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| PlexusError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
