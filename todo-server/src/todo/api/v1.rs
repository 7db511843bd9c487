use crate::query::{Page, SortDirection, SortField, TodoQuery, clamp_page_param};
use crate::tag::Tags;
use crate::todo::{BulkDeleteReport, Priority, Todo, TodoFields, TodoService};
use crate::web::api::v1::{ApiError, ErrorResponse};
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::Json,
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// State shared by the todo API handlers.
#[derive(Clone, Debug)]
pub struct TodoState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    /// Prefix the API is mounted under, without a trailing slash. Empty at the root.
    pub base_path: String,
}

/// JSON representation of a todo item for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    /// Unique identifier assigned on creation
    id: i32,
    name: String,
    description: Option<String>,
    is_complete: bool,
    /// When the item was created
    created_date: DateTime<Utc>,
    /// Calendar date the item is due
    due_date: Option<NaiveDate>,
    priority: Priority,
    /// Normalized tags in ascending order
    #[schema(value_type = Vec<String>)]
    tags: Tags,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id(),
            name: todo.name().to_string(),
            description: todo.description().map(str::to_string),
            is_complete: todo.is_complete(),
            created_date: todo.created_date(),
            due_date: todo.due_date(),
            priority: todo.priority(),
            tags: todo.tags().clone(),
        }
    }
}

/// Request body for creating or replacing a todo item.
///
/// Every field other than `name` is optional. On update, omitted fields are
/// reset to their defaults rather than kept.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoRequest {
    name: Option<String>,
    description: Option<String>,
    /// Defaults to `false`
    is_complete: Option<bool>,
    due_date: Option<NaiveDate>,
    /// Defaults to `Medium`
    priority: Option<Priority>,
    /// Raw tags; they are trimmed, lower-cased and de-duplicated
    #[schema(value_type = Option<Vec<String>>)]
    tags: Option<Tags>,
}

impl TryFrom<TodoRequest> for TodoFields {
    type Error = ApiError;

    fn try_from(request: TodoRequest) -> Result<Self, Self::Error> {
        let name = request
            .name
            .ok_or_else(|| ApiError::Validation("Todo name is required".to_string()))?;
        Ok(TodoFields {
            name,
            description: request.description,
            is_complete: request.is_complete.unwrap_or_default(),
            due_date: request.due_date,
            priority: request.priority.unwrap_or_default(),
            tags: request.tags.unwrap_or_default(),
        })
    }
}

/// Query parameters for listing todo items.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTodosParams {
    /// 1-based page number; values below 1 are treated as 1
    page_number: Option<i64>,
    /// Items per page; values below 1 are treated as 1
    page_size: Option<i64>,
    /// One of name, priority, dueDate, isComplete, createdDate. Unknown fields leave the list unsorted
    sort_by: Option<String>,
    /// asc or desc
    sort_direction: Option<String>,
    /// Low, Medium or High
    priority: Option<String>,
    is_complete: Option<bool>,
    /// Case-insensitive substring matched against name and description
    search_query: Option<String>,
    /// Only include items carrying this tag
    tag: Option<String>,
}

impl TryFrom<ListTodosParams> for TodoQuery {
    type Error = ApiError;

    fn try_from(params: ListTodosParams) -> Result<Self, Self::Error> {
        let defaults = TodoQuery::default();

        let priority = params
            .priority
            .map(|raw| raw.parse::<Priority>())
            .transpose()
            .map_err(ApiError::Validation)?;
        let sort_direction = params
            .sort_direction
            .map(|raw| raw.parse::<SortDirection>())
            .transpose()
            .map_err(ApiError::Validation)?
            .unwrap_or_default();
        let sort_by = params
            .sort_by
            .and_then(|raw| match raw.parse::<SortField>() {
                Ok(field) => Some(field),
                Err(reason) => {
                    tracing::warn!("{}; leaving results in ID order", reason);
                    None
                }
            });

        Ok(TodoQuery {
            search_query: params.search_query,
            priority,
            is_complete: params.is_complete,
            tag: params.tag,
            sort_by,
            sort_direction,
            page_number: params
                .page_number
                .map_or(defaults.page_number, clamp_page_param),
            page_size: params.page_size.map_or(defaults.page_size, clamp_page_param),
        })
    }
}

/// API response for a page of todo items.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoPageJson {
    data: Vec<TodoJson>,
    page_number: u32,
    page_size: u32,
    /// Number of matching items across all pages
    total_count: usize,
    total_pages: usize,
    has_next_page: bool,
    has_previous_page: bool,
}

impl From<Page<Todo>> for TodoPageJson {
    fn from(page: Page<Todo>) -> Self {
        let page = page.map(TodoJson::from);
        Self {
            data: page.data,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
            has_next_page: page.has_next_page,
            has_previous_page: page.has_previous_page,
        }
    }
}

/// API response for a bulk delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    deleted_count: usize,
    /// One message per item that could not be deleted
    failures: Vec<String>,
}

impl From<BulkDeleteReport> for BulkDeleteResponse {
    fn from(report: BulkDeleteReport) -> Self {
        Self {
            deleted_count: report.deleted_count,
            failures: report.failures,
        }
    }
}

fn to_json_list(todos: Vec<Todo>) -> Json<Vec<TodoJson>> {
    Json(todos.into_iter().map(TodoJson::from).collect())
}

/// Handler for GET /todoitems - Returns a filtered, sorted page of todo items.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todoitems",
    params(ListTodosParams),
    responses(
        (status = 200, description = "Successfully retrieved page", body = TodoPageJson),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
    params: Result<Query<ListTodosParams>, QueryRejection>,
) -> Result<Json<TodoPageJson>, ApiError> {
    let Query(params) = params?;
    let todo_query = TodoQuery::try_from(params)?;
    let page = TodoService::new(&state.db).query_todos(&todo_query).await?;
    Ok(Json(TodoPageJson::from(page)))
}

/// Handler for GET /todoitems/all - Returns every todo item.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todoitems/all",
    responses(
        (status = 200, description = "Successfully retrieved todo items", body = Vec<TodoJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_all_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<TodoJson>>, ApiError> {
    let todos = TodoService::new(&state.db).get_all_todos().await?;
    Ok(to_json_list(todos))
}

/// Handler for GET /todoitems/complete - Returns completed todo items.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todoitems/complete",
    responses(
        (status = 200, description = "Successfully retrieved completed todo items", body = Vec<TodoJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_complete_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<TodoJson>>, ApiError> {
    let todos = TodoService::new(&state.db).get_complete_todos().await?;
    Ok(to_json_list(todos))
}

/// Handler for DELETE /todoitems/complete - Deletes every completed todo item.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todoitems/complete",
    responses(
        (status = 200, description = "Completed todo items deleted; failures are listed", body = BulkDeleteResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn clear_completed_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    let report = TodoService::new(&state.db).clear_completed_todos().await?;
    Ok(Json(BulkDeleteResponse::from(report)))
}

/// Handler for GET /todoitems/{id} - Returns a single todo item.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todoitems/{id}",
    params(("id" = i32, Path, description = "Todo item ID")),
    responses(
        (status = 200, description = "Successfully retrieved todo item", body = TodoJson),
        (status = 404, description = "Todo item not found")
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<TodoJson>, ApiError> {
    let Path(id) = id?;
    let todo = TodoService::new(&state.db).get_todo(id).await?;
    Ok(Json(TodoJson::from(todo)))
}

/// Handler for GET /todoitems/tag/{tag} - Returns todo items carrying a tag.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todoitems/tag/{tag}",
    params(("tag" = String, Path, description = "Tag to filter by, matched case-insensitively")),
    responses(
        (status = 200, description = "Successfully retrieved todo items", body = Vec<TodoJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todos_by_tag_handler(
    State(state): State<Arc<TodoState>>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<TodoJson>>, ApiError> {
    let todos = TodoService::new(&state.db).get_todos_by_tag(&tag).await?;
    Ok(to_json_list(todos))
}

/// Handler for GET /tags - Returns every distinct tag, sorted.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tags",
    responses(
        (status = 200, description = "Successfully retrieved tags", body = Vec<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_all_tags_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let tags = TodoService::new(&state.db).get_all_tags().await?;
    Ok(Json(tags))
}

/// Handler for POST /todoitems - Creates a todo item.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/todoitems",
    request_body = TodoRequest,
    responses(
        (status = 201, description = "Todo item created", body = TodoJson,
            headers(("location" = String, description = "URL of the new todo item"))),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<TodoJson>), ApiError> {
    let Json(request) = payload?;
    let fields = TodoFields::try_from(request)?;
    let todo = TodoService::new(&state.db).create_todo(fields).await?;
    let location = format!("{}/todoitems/{}", state.base_path, todo.id());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TodoJson::from(todo)),
    ))
}

/// Handler for PUT /todoitems/{id} - Replaces every mutable field of a todo item.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/todoitems/{id}",
    params(("id" = i32, Path, description = "Todo item ID")),
    request_body = TodoRequest,
    responses(
        (status = 204, description = "Todo item updated"),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 404, description = "Todo item not found")
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<TodoRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let fields = TodoFields::try_from(request)?;
    TodoService::new(&state.db).update_todo(id, fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /todoitems/{id} - Deletes a todo item.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todoitems/{id}",
    params(("id" = i32, Path, description = "Todo item ID")),
    responses(
        (status = 204, description = "Todo item deleted"),
        (status = 404, description = "Todo item not found")
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    TodoService::new(&state.db).delete_todo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the todo API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route(
            "/todoitems",
            get(list_todos_handler).post(create_todo_handler),
        )
        .route("/todoitems/all", get(get_all_todos_handler))
        .route(
            "/todoitems/complete",
            get(get_complete_todos_handler).delete(clear_completed_todos_handler),
        )
        .route("/todoitems/tag/{tag}", get(get_todos_by_tag_handler))
        .route(
            "/todoitems/{id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/tags", get(get_all_tags_handler))
        .with_state(state)
}
