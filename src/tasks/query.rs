use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::projection::{TaskItemDto, TaskItemProjection};
use super::repository::TaskItemRepository;
use crate::errors::ApiError;
use crate::filtering::{
    FilterCondition, FilterModelConfiguration, FilterOperator, ValueType, generate_sort_expression, parse_filters,
    validate_filters,
};
use crate::mediator::{Request, RequestHandler};
use crate::models::{FilterRequest, PageWindow, PagedResponse};
use crate::validation::{ValidationErrors, Validator, validators};

/// Largest page a task list request may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_SORT_COLUMN: &str = "Id";
const USER_ID_FIELD: &str = "UserId";

/// Resolves the user a request runs on behalf of.
#[async_trait]
pub trait CurrentUser: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when no user is authenticated.
    async fn user_id(&self, cancel: &CancellationToken) -> Result<Uuid, ApiError>;
}

/// A page of the current user's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksQuery {
    pub filter: FilterRequest,
}

impl Request for TasksQuery {
    type Response = PagedResponse<TaskItemDto>;
}

pub struct TasksQueryValidator;

#[async_trait]
impl Validator<TasksQuery> for TasksQueryValidator {
    async fn validate(&self, request: &TasksQuery, _cancel: &CancellationToken) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_range(
            "PageSize",
            request.filter.page_size,
            None,
            Some(MAX_PAGE_SIZE),
        ));
        if let Some(column) = &request.filter.sort_column {
            errors.check(validators::validate_length("SortColumn", column, None, Some(100)));
        }
        errors
    }
}

pub struct TasksQueryHandler {
    configuration: Arc<FilterModelConfiguration<TaskItemProjection>>,
    current_user: Arc<dyn CurrentUser>,
    repository: Arc<dyn TaskItemRepository>,
}

impl TasksQueryHandler {
    #[must_use]
    pub fn new(
        configuration: Arc<FilterModelConfiguration<TaskItemProjection>>,
        current_user: Arc<dyn CurrentUser>,
        repository: Arc<dyn TaskItemRepository>,
    ) -> Self {
        Self {
            configuration,
            current_user,
            repository,
        }
    }
}

#[async_trait]
impl RequestHandler<TasksQuery> for TasksQueryHandler {
    async fn handle(
        &self,
        request: &TasksQuery,
        cancel: &CancellationToken,
    ) -> Result<PagedResponse<TaskItemDto>, ApiError> {
        let user_id = self.current_user.user_id(cancel).await?;

        // Results are always restricted to the caller's own jobs
        let mut conditions = request.filter.filter.clone();
        conditions.push(
            FilterCondition::new(USER_ID_FIELD, FilterOperator::Equals, [user_id.to_string()])
                .with_type(ValueType::Guid),
        );

        let conditions = validate_filters(&self.configuration, &conditions)?;
        let sort = generate_sort_expression(
            &self.configuration,
            request.filter.sort_column.as_deref(),
            request.filter.is_descending,
            DEFAULT_SORT_COLUMN,
        );
        let query = parse_filters(&conditions)?;

        let page = self
            .repository
            .find_filtered(&query, &sort, PageWindow::from_request(&request.filter), cancel)
            .await?;

        Ok(page.map(TaskItemDto::from))
    }
}
