use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Deserializer};

use crate::errors::StoreError;
use crate::models::TaskStatus;
use crate::registry::ConnectionRegistry;
use crate::store::{NewTask, TaskChanges, TaskStore};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: TaskStore,
    pub registry: Arc<ConnectionRegistry>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<chrono::NaiveDate>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
    pub created_by: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Full-replacement body for `PUT`. Every field is applied; omitted
/// optionals reset to their defaults. The write declares no changed-field
/// set, so the notification core treats it as an unspecified update.
#[derive(Deserialize)]
pub struct ReplaceTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<chrono::NaiveDate>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
}

/// Partial-update body for `PATCH`. A field absent from the JSON is left
/// untouched; `"assigned_to": null` explicitly clears the assignee. The
/// names of the fields present become the write's changed-field set.
#[derive(Deserialize, Default)]
pub struct PatchTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<chrono::NaiveDate>>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to: Option<Option<i64>>,
}

/// Distinguishes an absent key (outer `None`, via `default`) from an
/// explicit `null` (Some(None)).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct AddTagsRequest {
    pub tags: Vec<String>,
}

/// Query filters for the task list: exact-match on status and due date.
#[derive(Deserialize, Default)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub due_date: Option<chrono::NaiveDate>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub user: i64,
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::TaskNotFound { .. } | StoreError::CommentNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            StoreError::InvalidStatus { .. } => ApiError::BadRequest(err.to_string()),
            StoreError::LockPoisoned => ApiError::Internal(err.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task)
                .put(replace_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .route("/api/tasks/{id}/tags", axum::routing::post(add_tags))
        .route(
            "/api/tasks/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/comments/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn list_tasks(
    State(state): State<SharedState>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tasks = state.store.list_tasks()?;
    if let Some(status) = query.status {
        tasks.retain(|t| t.status == status);
    }
    if let Some(due_date) = query.due_date {
        tasks.retain(|t| t.due_date == Some(due_date));
    }
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<SharedState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    let task = state.store.create_task(NewTask {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        status: req.status,
        assigned_to: req.assigned_to,
        created_by: req.created_by,
        tags: req.tags,
    })?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.store.get_task(id)?;
    Ok(Json(task))
}

async fn replace_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<ReplaceTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    let changes = TaskChanges {
        title: Some(req.title),
        description: Some(req.description),
        due_date: Some(req.due_date),
        status: Some(req.status.unwrap_or_default()),
        assigned_to: Some(req.assigned_to),
    };
    // Full replacement: no changed-field set is declared.
    let task = state.store.update_task(id, changes, None)?;
    Ok(Json(task))
}

async fn patch_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<PatchTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut changed = HashSet::new();
    if req.title.is_some() {
        changed.insert("title".to_string());
    }
    if req.description.is_some() {
        changed.insert("description".to_string());
    }
    if req.due_date.is_some() {
        changed.insert("due_date".to_string());
    }
    if req.status.is_some() {
        changed.insert("status".to_string());
    }
    if req.assigned_to.is_some() {
        changed.insert("assigned_to".to_string());
    }

    let changes = TaskChanges {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        status: req.status,
        assigned_to: req.assigned_to,
    };
    let task = state.store.update_task(id, changes, Some(changed))?;
    Ok(Json(task))
}

async fn add_tags(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AddTagsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.store.add_tags(id, req.tags)?;
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_task(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_comments(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.store.list_comments(id)?;
    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content must not be empty".to_string()));
    }
    let comment = state.store.create_comment(id, req.user, req.content)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.store.get_comment(id)?;
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content must not be empty".to_string()));
    }
    let comment = state.store.update_comment(id, req.content)?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_comment(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Tests ─────────────────────────────────────────────────────────────
