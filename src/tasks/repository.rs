use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, EntityTrait, Iterable, JoinType, QueryFilter, QuerySelect, RelationTrait, Select,
    sea_query::{CaseStatement, Expr, SimpleExpr},
};
use tokio_util::sync::CancellationToken;

use super::entity::{job, task_item};
use super::projection::{TaskItemProjection, TaskItemStatus};
use crate::database::{apply_sort, build_condition, fetch_page};
use crate::errors::ApiError;
use crate::filtering::{DynamicQuery, SortExpression};
use crate::models::{PageWindow, PagedResponse};

/// Read access to task items for list queries.
#[async_trait]
pub trait TaskItemRepository: Send + Sync {
    /// Rows matching `query`, ordered by `sort`, inside `window`, plus the
    /// number of rows matching before paging.
    async fn find_filtered(
        &self,
        query: &DynamicQuery,
        sort: &SortExpression,
        window: PageWindow,
        cancel: &CancellationToken,
    ) -> Result<PagedResponse<TaskItemProjection>, ApiError>;
}

/// [`TaskItemRepository`] over the `task_items` and `jobs` tables.
#[derive(Debug, Clone)]
pub struct SeaOrmTaskItemRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskItemRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn task_column(column: task_item::Column) -> SimpleExpr {
    Expr::col((task_item::Entity, column)).into()
}

fn filter_columns() -> Vec<(&'static str, SimpleExpr)> {
    vec![
        ("Id", task_column(task_item::Column::Id)),
        ("JobId", task_column(task_item::Column::JobId)),
        ("UserId", Expr::col((job::Entity, job::Column::UserId)).into()),
        ("Title", task_column(task_item::Column::Title)),
        ("Description", task_column(task_item::Column::Description)),
        ("Status", task_column(task_item::Column::Status)),
        ("CreatedAtUtc", task_column(task_item::Column::CreatedAtUtc)),
        ("CreatedBy", task_column(task_item::Column::CreatedBy)),
        ("ModifiedAtUtc", task_column(task_item::Column::ModifiedAtUtc)),
        ("ModifiedBy", task_column(task_item::Column::ModifiedBy)),
    ]
}

/// Same as the filter columns, except that status sorts by name.
fn sort_columns() -> Vec<(&'static str, SimpleExpr)> {
    filter_columns()
        .into_iter()
        .map(|(name, expr)| {
            if name == "Status" {
                (name, status_name())
            } else {
                (name, expr)
            }
        })
        .collect()
}

/// `CASE status WHEN 0 THEN 'Unspecified' ... END`
fn status_name() -> SimpleExpr {
    TaskItemStatus::iter()
        .fold(CaseStatement::new(), |case, status| {
            case.case(
                Expr::col((task_item::Entity, task_item::Column::Status)).eq(i32::from(status)),
                status.name(),
            )
        })
        .finally(TaskItemStatus::Unspecified.name())
        .into()
}

fn projection() -> Select<task_item::Entity> {
    task_item::Entity::find()
        .select_only()
        .column(task_item::Column::Id)
        .column(task_item::Column::JobId)
        .column_as(job::Column::UserId, "user_id")
        .column(task_item::Column::Title)
        .column(task_item::Column::Description)
        .column(task_item::Column::Status)
        .column(task_item::Column::CreatedAtUtc)
        .column(task_item::Column::CreatedBy)
        .column(task_item::Column::ModifiedAtUtc)
        .column(task_item::Column::ModifiedBy)
        .join(JoinType::InnerJoin, task_item::Relation::Job.def())
}

#[async_trait]
impl TaskItemRepository for SeaOrmTaskItemRepository {
    async fn find_filtered(
        &self,
        query: &DynamicQuery,
        sort: &SortExpression,
        window: PageWindow,
        cancel: &CancellationToken,
    ) -> Result<PagedResponse<TaskItemProjection>, ApiError> {
        let condition = build_condition(query, &filter_columns())?;
        let select = apply_sort(
            projection().filter(condition),
            sort,
            &sort_columns(),
            task_column(task_item::Column::Id),
        )?;

        tracing::debug!(filter = %query.predicate_text(), sort = %sort, "Querying task items");

        let page = cancel
            .run_until_cancelled(fetch_page::<_, TaskItemProjection, _>(&self.db, select, window))
            .await
            .ok_or_else(ApiError::cancelled)??;
        Ok(page)
    }
}
