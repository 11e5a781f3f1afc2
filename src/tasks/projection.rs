use chrono::NaiveDateTime;
use sea_orm::{ActiveEnum, DbErr, DeriveActiveEnum, EnumIter, FromQueryResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::filtering::{FieldDescriptor, FilterModel, ValueType};

/// Progress of a task. Stored and sent over the wire as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(into = "i32", try_from = "i32")]
pub enum TaskItemStatus {
    #[default]
    #[sea_orm(num_value = 0)]
    Unspecified,
    #[sea_orm(num_value = 1)]
    NotStarted,
    #[sea_orm(num_value = 2)]
    InProgress,
    #[sea_orm(num_value = 3)]
    Completed,
    #[sea_orm(num_value = 4)]
    Blocked,
}

impl TaskItemStatus {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Blocked => "Blocked",
        }
    }
}

impl From<TaskItemStatus> for i32 {
    fn from(status: TaskItemStatus) -> Self {
        status.to_value()
    }
}

impl TryFrom<i32> for TaskItemStatus {
    type Error = DbErr;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        <Self as ActiveEnum>::try_from_value(&value)
    }
}

/// A task joined with the owner of its job: the shape task lists are
/// filtered, sorted and paged over.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct TaskItemProjection {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskItemStatus,
    pub created_at_utc: NaiveDateTime,
    pub created_by: String,
    pub modified_at_utc: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
}

impl FilterModel for TaskItemProjection {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("Id", ValueType::Guid),
            FieldDescriptor::scalar("JobId", ValueType::Guid),
            FieldDescriptor::scalar("UserId", ValueType::Guid),
            FieldDescriptor::scalar("Title", ValueType::String),
            FieldDescriptor::scalar("Description", ValueType::String),
            FieldDescriptor::scalar("Status", ValueType::Enum),
            FieldDescriptor::scalar("CreatedAtUtc", ValueType::DateTime),
            FieldDescriptor::scalar("CreatedBy", ValueType::String),
            FieldDescriptor::scalar("ModifiedAtUtc", ValueType::DateTime),
            FieldDescriptor::scalar("ModifiedBy", ValueType::String),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskItemDto {
    pub id: Uuid,
    pub job_id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(value_type = i32)]
    pub status: TaskItemStatus,
    pub created_at_utc: NaiveDateTime,
    pub created_by: String,
    pub modified_at_utc: Option<NaiveDateTime>,
    pub modified_by: Option<String>,
}

impl From<TaskItemProjection> for TaskItemDto {
    fn from(projection: TaskItemProjection) -> Self {
        Self {
            id: projection.id,
            job_id: projection.job_id,
            title: projection.title,
            description: projection.description,
            status: projection.status,
            created_at_utc: projection.created_at_utc,
            created_by: projection.created_by,
            modified_at_utc: projection.modified_at_utc,
            modified_by: projection.modified_by,
        }
    }
}
