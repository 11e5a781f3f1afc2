//! # Error Handling
//!
//! Every fallible operation in this crate returns one of three error types:
//!
//! - [`FilterError`]: a filter request could not be turned into a query
//!   (wrong value count for `Between`, a value that does not convert to the
//!   column type, a column the persistence layer does not know).
//! - [`ValidationErrors`]: one or more `(field, message)` failures, raised by
//!   filter validation or by the request pipeline's validation stage.
//! - [`ApiError`]: the error every handler and pipeline stage returns. Both of
//!   the above convert into it with `?`.
//!
//! `ApiError` implements [`IntoResponse`], so an axum handler can return it
//! directly. Client errors become a structured 400 body; configuration,
//! database and internal errors are logged with `tracing` and answered with a
//! sanitized 500.
//!
//! ```rust,ignore
//! async fn list_tasks(
//!     State(mediator): State<Arc<Mediator>>,
//!     Json(filter): Json<FilterRequest>,
//! ) -> Result<Json<PagedResponse<TaskItemDto>>, ApiError> {
//!     let page = mediator
//!         .send(TasksQuery { filter }, &CancellationToken::new())
//!         .await?;
//!     Ok(Json(page))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::validation::ValidationErrors;

/// A filter request that cannot be compiled into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    message: String,
}

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap a lower-level failure raised while building a single clause.
    pub fn parsing(details: impl fmt::Display) -> Self {
        Self::new(format!("Error parsing filter condition: {details}"))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FilterError {}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// 400 Bad Request
    BadRequest { message: String },

    /// 401 Unauthorized
    Unauthorized { message: String },

    /// 403 Forbidden
    Forbidden { message: String },

    /// 409 Conflict
    Conflict { message: String },

    /// 400 Bad Request - field level validation failures, grouped by field
    ValidationFailed { errors: ValidationErrors },

    /// 400 Bad Request - the filter could not be compiled
    Filter(FilterError),

    /// 500 Internal Server Error - no handler registered for a request type.
    ///
    /// This is a wiring defect in the composition root, never a client error.
    HandlerNotFound { request_type: &'static str },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database { message: String, internal: DbErr },

    /// 500 Internal Server Error - Generic internal error
    Internal {
        message: String,
        internal: Option<String>,
    },

    /// Custom error with specific status code
    Custom {
        status: StatusCode,
        message: String,
        internal: Option<String>,
    },
}

impl ApiError {
    // ============================================================================
    // Constructors for common error types
    // ============================================================================

    /// Create a 404 Not Found error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(ApiError::not_found("Job", Some(job_id.to_string())));
    /// ```
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation_failed(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }

    #[must_use]
    pub fn handler_not_found(request_type: &'static str) -> Self {
        Self::HandlerNotFound { request_type }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    pub fn custom(status: StatusCode, message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Custom {
            status,
            message: message.into(),
            internal,
        }
    }

    /// The request's cancellation token fired before the work completed.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::custom(StatusCode::REQUEST_TIMEOUT, "Request was cancelled", None)
    }

    // ============================================================================
    // Internal methods
    // ============================================================================

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } | Self::ValidationFailed { .. } | Self::Filter(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::HandlerNotFound { .. } | Self::Database { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Custom { status, .. } => *status,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => {
                if let Some(id) = id {
                    format!("{resource} with ID '{id}' not found")
                } else {
                    format!("{resource} not found")
                }
            }
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Conflict { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. }
            | Self::Custom { message, .. } => message.clone(),
            Self::ValidationFailed { errors } => match errors.errors() {
                [single] => single.message.clone(),
                _ => "One or more validation errors occurred".to_string(),
            },
            Self::Filter(err) => err.message().to_string(),
            Self::HandlerNotFound { .. } => "An internal error occurred".to_string(),
        }
    }

    /// Log internal error details (not sent to user)
    ///
    /// Uses the `tracing` crate - only logs if the application has installed a
    /// subscriber.
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::HandlerNotFound { request_type } => {
                tracing::error!(request.type = request_type, "No handler registered for request");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::Custom {
                internal: Some(details),
                status,
                ..
            } => {
                tracing::error!(status = %status, details = %details, "Custom error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();

        let response = match &self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.grouped()),
            },
            Self::Filter(err) => ErrorResponse {
                error: "Invalid filter".to_string(),
                details: Some(BTreeMap::from([(
                    "filter".to_string(),
                    vec![err.message().to_string()],
                )])),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed { errors } => write!(f, "{errors}"),
            Self::HandlerNotFound { request_type } => {
                write!(f, "No handler found for request of type {request_type}")
            }
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// Conversions from common error types
// ============================================================================

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        Self::Filter(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed { errors }
    }
}

/// `DbErr::RecordNotFound` becomes a 404; every other database error is a
/// sanitized 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}
