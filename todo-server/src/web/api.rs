use std::sync::Arc;

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::todo::api::v1::TodoState;

pub mod v1 {
    use axum::{
        Json,
        extract::rejection::{JsonRejection, PathRejection, QueryRejection},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use utoipa::ToSchema;

    use crate::todo::TodoServiceError;

    /// JSON response for API errors
    #[derive(serde::Serialize, serde::Deserialize, Debug, ToSchema)]
    pub struct ErrorResponse {
        pub error: String,
        pub message: String,
    }

    impl ErrorResponse {
        pub fn new(error: &str, message: String) -> Self {
            Self {
                error: error.to_string(),
                message,
            }
        }
    }

    /// Error type for JSON API handlers.
    #[derive(Debug, thiserror::Error)]
    pub enum ApiError {
        /// The referenced resource does not exist. Rendered as a 404 with no body.
        #[error("Resource not found")]
        NotFound,
        /// Malformed or missing input.
        #[error("Validation failed: {0}")]
        Validation(String),
        /// Represents a database error. Never shown to the caller.
        #[error("Database error: {0}")]
        Database(#[source] sea_orm::DbErr),
    }

    impl From<TodoServiceError> for ApiError {
        fn from(error: TodoServiceError) -> Self {
            match error {
                TodoServiceError::NotFound(_) => ApiError::NotFound,
                TodoServiceError::Validation(message) => ApiError::Validation(message),
                TodoServiceError::Database(db_error) => ApiError::Database(db_error),
            }
        }
    }

    impl From<JsonRejection> for ApiError {
        fn from(rejection: JsonRejection) -> Self {
            ApiError::Validation(rejection.body_text())
        }
    }

    impl From<QueryRejection> for ApiError {
        fn from(rejection: QueryRejection) -> Self {
            ApiError::Validation(rejection.body_text())
        }
    }

    impl From<PathRejection> for ApiError {
        fn from(rejection: PathRejection) -> Self {
            ApiError::Validation(rejection.body_text())
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            match self {
                ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
                ApiError::Validation(message) => (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("VALIDATION_ERROR", message)),
                )
                    .into_response(),
                ApiError::Database(db_error) => {
                    tracing::error!("Unhandled database error: {}", db_error);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse::new(
                            "INTERNAL_ERROR",
                            "An unexpected error occurred while processing your request. Please try again later.".to_string(),
                        )),
                    )
                        .into_response()
                }
            }
        }
    }
}

/// OpenAPI description of the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::todo::api::v1::list_todos_handler,
        crate::todo::api::v1::get_all_todos_handler,
        crate::todo::api::v1::get_complete_todos_handler,
        crate::todo::api::v1::clear_completed_todos_handler,
        crate::todo::api::v1::get_todo_handler,
        crate::todo::api::v1::get_todos_by_tag_handler,
        crate::todo::api::v1::get_all_tags_handler,
        crate::todo::api::v1::create_todo_handler,
        crate::todo::api::v1::update_todo_handler,
        crate::todo::api::v1::delete_todo_handler,
    ),
    components(schemas(
        crate::todo::api::v1::TodoJson,
        crate::todo::api::v1::TodoRequest,
        crate::todo::api::v1::TodoPageJson,
        crate::todo::api::v1::BulkDeleteResponse,
        crate::todo::Priority,
        v1::ErrorResponse,
    )),
    tags((name = "Todos", description = "Todo item management"))
)]
pub struct ApiDoc;

/// Handler for GET /api-docs/openapi.json
#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(todo_state: Arc<TodoState>) -> Router {
    crate::todo::api::v1::create_api_router(todo_state)
        .route("/api-docs/openapi.json", get(openapi_handler))
}
