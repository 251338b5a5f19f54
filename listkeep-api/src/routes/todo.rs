//! Todo REST API Routes
//!
//! Every todo route requires a resolved user. Single-item reads go through
//! the retrieval orchestrator and its read-through cache; listing and
//! writes go straight to the store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use listkeep_core::{ItemId, ItemKind, UserId};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    state::{AppState, TodoServices},
    telemetry::metrics::{record_cache_lookup, CacheOutcome},
    types::{
        ChangeTodoRequest, CreateTodoRequest, ListTodosQuery, PaginatedResponse, TodoResponse,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/todo/get/:id - Read one todo through the cache
///
/// The cache is keyed per the configured key mode; under the default
/// user-keyed mode a hit may return a different todo than `id`.
pub async fn get_todo(
    State(todos): State<TodoServices>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<TodoResponse>> {
    let id = ItemId::new(id);
    let cancel = CancellationToken::new();
    // Dropping the handler (client gone, timeout) cancels the retrieval.
    let _guard = cancel.clone().drop_guard();

    let result = todos.retrieval.get_item(id, &user, &cancel).await;
    record_cache_lookup(ItemKind::Todo, CacheOutcome::of(&result));

    match result? {
        Some(read) => Ok(Json(read.into_value().into())),
        None => Err(ApiError::entity_not_found(ItemKind::Todo.as_str(), id)),
    }
}

/// GET /api/todo/all - List todos with pagination and completion filter
pub async fn list_todos(
    State(todos): State<TodoServices>,
    State(config): State<Arc<ApiConfig>>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListTodosQuery>,
) -> ApiResult<Json<PaginatedResponse<TodoResponse>>> {
    let page = query.page_request(&config)?;
    let slice = todos.listing.list(page, &query.filter()).await?;
    Ok(Json(PaginatedResponse::from_slice(slice)))
}

/// POST /api/todo/create - Create a todo owned by the acting user
pub async fn create_todo(
    State(todos): State<TodoServices>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    let owner: UserId = user.id;
    let todo = todos.store.create(owner, req.into()).await?;
    tracing::info!(id = %todo.id, owner = %todo.owner_id, "todo created");
    Ok(Json(todo.into()))
}

/// POST /api/todo/change/:id - Set the completion flag
///
/// A missing todo answers with the same generic failure as a rejected
/// change. The cache is left as is.
pub async fn change_todo(
    State(todos): State<TodoServices>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ChangeTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    let id = ItemId::new(id);
    match todos.store.update(id, req.into()).await? {
        Some(todo) => Ok(Json(todo.into())),
        None => {
            tracing::debug!(id = %id, "change of missing todo");
            Err(ApiError::operation_failed())
        }
    }
}

/// DELETE /api/todo/delete/:id - Delete a todo
///
/// 200 when deleted, 400 when absent or refused. The cache is left as is.
pub async fn delete_todo(
    State(todos): State<TodoServices>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let id = ItemId::new(id);
    if todos.store.delete(id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::delete_failed(ItemKind::Todo.as_str(), id))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/get/:id", get(get_todo))
        .route("/all", get(list_todos))
        .route("/create", post(create_todo))
        .route("/change/:id", post(change_todo))
        .route("/delete/:id", delete(delete_todo))
}
