// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Identity comes from the `x-user-id` header set by the authenticating
//! proxy in front of the gateway. Bodies and responses are camelCase JSON.

use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use plexus_core::{HealthStatus, PlexusError};
use plexus_core::types::{
    Comment, Connection, ContentItem, ContentKind, DirectMessage, Notification, PairStatus, Page,
    Principal, SubjectType, Visibility,
};
use plexus_engine::UnreadCounts;
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`PlexusError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(PlexusError);

impl From<PlexusError> for ApiError {
    fn from(err: PlexusError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PlexusError::Validation(_) => StatusCode::BAD_REQUEST,
            PlexusError::Authorization(_) => StatusCode::FORBIDDEN,
            PlexusError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlexusError::Conflict(_) | PlexusError::AlreadyExists { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn header_user_id(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The authenticated caller, resolved against the user table.
pub struct Caller(pub Principal);

impl FromRequestParts<GatewayState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_user_id(parts).ok_or_else(|| {
            PlexusError::Authorization(format!("missing {USER_ID_HEADER} header"))
        })?;
        let user = state
            .engine
            .storage()
            .get_user(&user_id)
            .await?
            .ok_or_else(|| PlexusError::Authorization("unknown user".to_string()))?;
        Ok(Self(Principal::from(&user)))
    }
}

/// The viewer for read-only endpoints. Absent means anonymous.
pub struct Viewer(pub Option<String>);

impl FromRequestParts<GatewayState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(header_user_id(parts)))
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub connected_users: usize,
}

pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let status = match state.engine.storage().health_check().await {
        Ok(HealthStatus::Healthy) => "healthy".to_string(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
        Err(e) => format!("unhealthy: {e}"),
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        connected_users: state.registry.connected_users(),
    })
}

/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.metrics_render {
        Some(render) => (
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// --- Connections ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequestBody {
    pub target_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn post_connection(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Json(req): Json<ConnectionRequestBody>,
) -> ApiResult<(StatusCode, Json<Connection>)> {
    let connection = state
        .engine
        .connections()
        .request(&principal.user_id, &req.target_id, req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

pub async fn post_accept_connection(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Connection>> {
    let connection = state.engine.connections().accept(&id, &principal.user_id).await?;
    Ok(Json(connection))
}

pub async fn post_reject_connection(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Connection>> {
    let connection = state.engine.connections().reject(&id, &principal.user_id).await?;
    Ok(Json(connection))
}

pub async fn get_pending_connections(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
) -> ApiResult<Json<Vec<Connection>>> {
    let pending = state
        .engine
        .connections()
        .pending_incoming(&principal.user_id)
        .await?;
    Ok(Json(pending))
}

/// `null` when the pair has no connection.
pub async fn get_connection_status(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Option<PairStatus>>> {
    let status = state
        .engine
        .connections()
        .status_between(&principal.user_id, &user_id)
        .await?;
    Ok(Json(status))
}

// --- Posts and feed ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub body: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub mention_ids: Vec<String>,
}

pub async fn post_post(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Json(req): Json<PostBody>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = state
        .engine
        .activity()
        .create_post(
            &principal,
            &req.body,
            req.visibility.unwrap_or(Visibility::Public),
            &req.mention_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn patch_post(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    Json(req): Json<PostBody>,
) -> ApiResult<Json<ContentItem>> {
    let item = state
        .engine
        .activity()
        .edit_post(&principal, &id, &req.body, &req.mention_ids)
        .await?;
    Ok(Json(item))
}

pub async fn get_post(
    State(state): State<GatewayState>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = state.engine.activity().get_post(viewer.as_deref(), &id).await?;
    Ok(Json(item))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

pub async fn get_feed(
    State(state): State<GatewayState>,
    Viewer(viewer): Viewer,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<ContentItem>>> {
    let items = state
        .engine
        .activity()
        .feed(viewer.as_deref(), params.limit, params.offset)
        .await?;
    Ok(Json(items))
}

// --- Likes and comments ---

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeCountResponse {
    pub likes: i64,
}

pub async fn get_like_count(
    State(state): State<GatewayState>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeCountResponse>> {
    let likes = state.engine.activity().like_count(viewer.as_deref(), &id).await?;
    Ok(Json(LikeCountResponse { likes }))
}

pub async fn post_like(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine.activity().like(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_like(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine.activity().unlike(&principal, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub mention_ids: Vec<String>,
}

pub async fn post_comment(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
    Json(req): Json<CommentBody>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .engine
        .activity()
        .comment(
            &principal,
            &id,
            &req.body,
            req.parent_id.as_deref(),
            &req.mention_ids,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// --- Broadcasts and receipts ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastBody {
    pub kind: ContentKind,
    pub body: String,
    #[serde(default)]
    pub publish_now: bool,
}

pub async fn post_broadcast(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Json(req): Json<BroadcastBody>,
) -> ApiResult<(StatusCode, Json<ContentItem>)> {
    let item = state
        .engine
        .activity()
        .create_broadcast(&principal, req.kind, &req.body, req.publish_now)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn post_publish(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ContentItem>> {
    let item = state.engine.activity().publish(&principal, &id).await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBody {
    pub subject_id: String,
    pub subject_type: SubjectType,
}

pub async fn post_receipt(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Json(req): Json<ReceiptBody>,
) -> ApiResult<StatusCode> {
    state
        .engine
        .receipts()
        .mark_read(&req.subject_id, req.subject_type, &principal.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_unread_broadcasts(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
) -> ApiResult<Json<UnreadCounts>> {
    let counts = state.engine.receipts().unread_count(&principal.user_id).await?;
    Ok(Json(counts))
}

// --- Direct messages ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub recipient_id: String,
    pub body: String,
}

pub async fn post_message(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Json(req): Json<MessageBody>,
) -> ApiResult<(StatusCode, Json<DirectMessage>)> {
    let message = state
        .engine
        .activity()
        .send_message(&principal, &req.recipient_id, &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

// --- Notifications ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

pub async fn get_notifications(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Query(params): Query<NotificationParams>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let notifications = state
        .engine
        .inbox()
        .list(
            &principal.user_id,
            params.unread_only,
            Page::new(limit, params.offset),
        )
        .await?;
    Ok(Json(notifications))
}

pub async fn post_notification_read(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine.inbox().mark_read(&id, &principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

pub async fn post_read_all(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
) -> ApiResult<Json<CountResponse>> {
    let flipped = state.engine.inbox().mark_all_read(&principal.user_id).await?;
    Ok(Json(CountResponse {
        count: flipped as i64,
    }))
}

pub async fn get_unread_notifications(
    State(state): State<GatewayState>,
    Caller(principal): Caller,
) -> ApiResult<Json<CountResponse>> {
    let count = state.engine.inbox().unread_count(&principal.user_id).await?;
    Ok(Json(CountResponse { count }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use plexus_config::PlexusConfig;
    use plexus_core::StorageAdapter;
    use plexus_core::types::{Role, User};
    use plexus_engine::Engine;
    use plexus_storage::SqliteStorage;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::registry::SessionRegistry;
    use crate::server::router;

    struct App {
        state: GatewayState,
        _dir: tempfile::TempDir,
    }

    async fn app(users: &[(&str, Role)]) -> App {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PlexusConfig::default();
        config.storage.database_path = dir.path().join("gw.db").to_string_lossy().into_owned();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        for (id, role) in users {
            storage
                .insert_user(&User {
                    id: id.to_string(),
                    display_name: id.to_string(),
                    email: format!("{id}@campus.example"),
                    institution_id: None,
                    role: *role,
                    verified: true,
                    created_at: "2026-01-01T00:00:00.000Z".to_string(),
                })
                .await
                .unwrap();
        }

        let registry = Arc::new(SessionRegistry::new(8));
        let engine = Arc::new(Engine::new(&config, storage, registry.clone()));
        App {
            state: GatewayState::new(engine, registry),
            _dir: dir,
        }
    }

    impl App {
        async fn call(
            &self,
            method: Method,
            uri: &str,
            user: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                builder = builder.header(USER_ID_HEADER, user);
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (PlexusError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (PlexusError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (PlexusError::not_found("post", "p"), StatusCode::NOT_FOUND),
            (PlexusError::Conflict("x".into()), StatusCode::CONFLICT),
            (PlexusError::AlreadyExists { entity: "like" }, StatusCode::CONFLICT),
            (PlexusError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = ApiError::from(PlexusError::Internal("db path /secret".into())).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "internal error");
    }

    #[tokio::test]
    async fn missing_or_unknown_caller_is_forbidden() {
        let app = app(&[("alice", Role::Member)]).await;
        let body = json!({ "body": "hi" });
        let (status, _) = app.call(Method::POST, "/v1/posts", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.call(Method::POST, "/v1/posts", Some("ghost"), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn connection_lifecycle_over_http() {
        let app = app(&[("alice", Role::Member), ("bob", Role::Member)]).await;

        let (status, conn) = app
            .call(Method::POST, "/v1/connections", Some("alice"), Some(json!({ "targetId": "bob" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = conn["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call(Method::POST, "/v1/connections", Some("bob"), Some(json!({ "targetId": "alice" })))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, pending) = app.call(Method::GET, "/v1/connections/pending", Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let uri = format!("/v1/connections/{id}/accept");
        let (status, accepted) = app.call(Method::POST, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "ACCEPTED");
        let (status, _) = app.call(Method::POST, &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, pair) = app
            .call(Method::GET, "/v1/connections/status/alice", Some("bob"), None)
            .await;
        assert_eq!(pair["status"], "ACCEPTED");
        assert_eq!(pair["isRequester"], false);
    }

    #[tokio::test]
    async fn connections_scoped_post_is_hidden_from_anonymous_feed() {
        let app = app(&[("x", Role::Member)]).await;
        let (status, post) = app
            .call(
                Method::POST,
                "/v1/posts",
                Some("x"),
                Some(json!({ "body": "peers only", "visibility": "CONNECTIONS" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = post["id"].as_str().unwrap().to_string();

        let (_, own) = app.call(Method::GET, "/v1/feed", Some("x"), None).await;
        assert_eq!(own.as_array().unwrap().len(), 1);
        let (_, anon) = app.call(Method::GET, "/v1/feed", None, None).await;
        assert!(anon.as_array().unwrap().is_empty());
        let (status, _) = app.call(Method::GET, &format!("/v1/posts/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_post_body_is_bad_request() {
        let app = app(&[("x", Role::Member)]).await;
        let (status, body) = app
            .call(Method::POST, "/v1/posts", Some("x"), Some(json!({ "body": "   " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("validation"));
    }

    #[tokio::test]
    async fn like_reaches_the_owner_inbox() {
        let app = app(&[("owner", Role::Member), ("fan", Role::Member)]).await;
        let (_, post) = app
            .call(Method::POST, "/v1/posts", Some("owner"), Some(json!({ "body": "hello" })))
            .await;
        let likes = format!("/v1/content/{}/likes", post["id"].as_str().unwrap());

        let (status, _) = app.call(Method::POST, &likes, Some("fan"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, count) = app.call(Method::GET, &likes, None, None).await;
        assert_eq!(count["likes"], 1);

        let (_, unread) = app
            .call(Method::GET, "/v1/notifications/unread-count", Some("owner"), None)
            .await;
        assert_eq!(unread["count"], 1);
        let (_, list) = app.call(Method::GET, "/v1/notifications", Some("owner"), None).await;
        assert_eq!(list[0]["type"], "LIKE");

        let (_, flipped) = app
            .call(Method::POST, "/v1/notifications/read-all", Some("owner"), None)
            .await;
        assert_eq!(flipped["count"], 1);
    }

    #[tokio::test]
    async fn broadcasts_require_admin_and_count_unread() {
        let app = app(&[("admin", Role::Admin), ("member", Role::Member)]).await;
        let body = json!({ "kind": "ANNOUNCEMENT", "body": "exam week", "publishNow": true });

        let (status, _) = app
            .call(Method::POST, "/v1/broadcasts", Some("member"), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, item) = app.call(Method::POST, "/v1/broadcasts", Some("admin"), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["published"], true);

        let (_, counts) = app.call(Method::GET, "/v1/receipts/unread", Some("member"), None).await;
        assert_eq!(counts["announcements"], 1);

        let receipt = json!({ "subjectId": item["id"], "subjectType": "ANNOUNCEMENT" });
        let (status, _) = app
            .call(Method::POST, "/v1/receipts", Some("member"), Some(receipt))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, counts) = app.call(Method::GET, "/v1/receipts/unread", Some("member"), None).await;
        assert_eq!(counts["total"], 0);
    }

    #[tokio::test]
    async fn message_to_stranger_is_forbidden() {
        let app = app(&[("a", Role::Member), ("b", Role::Member)]).await;
        let (status, _) = app
            .call(
                Method::POST,
                "/v1/messages",
                Some("a"),
                Some(json!({ "recipientId": "b", "body": "hi" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn notification_is_pushed_to_live_session() {
        let app = app(&[("owner", Role::Member), ("fan", Role::Member)]).await;
        let (_sid, mut rx) = app.state.registry.open_session("owner");

        let (_, post) = app
            .call(Method::POST, "/v1/posts", Some("owner"), Some(json!({ "body": "hello" })))
            .await;
        let likes = format!("/v1/content/{}/likes", post["id"].as_str().unwrap());
        app.call(Method::POST, &likes, Some("fan"), None).await;

        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "notification");
        assert_eq!(frame["data"]["type"], "LIKE");
        assert_eq!(frame["data"]["relatedId"], post["id"]);
    }

    #[tokio::test]
    async fn metrics_route_uses_renderer_when_present() {
        let app = app(&[]).await;
        let response = router(app.state.clone())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let state = app.state.clone().with_metrics(Arc::new(|| "plexus_up 1\n".to_string()));
        let response = router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"plexus_up 1\n");
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let app = app(&[]).await;
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["connected_users"], 0);
    }
}
