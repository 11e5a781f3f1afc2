#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use taskmanager_core::ApiError;
use taskmanager_core::filtering::FilterModelConfiguration;
use taskmanager_core::mediator::Mediator;
use taskmanager_core::tasks::entity::{job, task_item};
use taskmanager_core::tasks::{self, CurrentUser, SeaOrmTaskItemRepository, TaskItemStatus, TasksQueryHandler};
use taskmanager_core::validation::ValidatorRegistry;

/// Send `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Mediator wired the way the API wires it, acting as `user`.
pub fn setup_mediator(db: DatabaseConnection, user: Uuid) -> Mediator {
    let mut validators = ValidatorRegistry::new();
    tasks::register_validators(&mut validators);

    let handler = TasksQueryHandler::new(
        Arc::new(FilterModelConfiguration::new()),
        Arc::new(FixedUser(user)),
        Arc::new(SeaOrmTaskItemRepository::new(db)),
    );
    tasks::register_handlers(Mediator::builder().with_validators(validators), handler).build()
}

pub struct FixedUser(pub Uuid);

#[async_trait]
impl CurrentUser for FixedUser {
    async fn user_id(&self, _cancel: &CancellationToken) -> Result<Uuid, ApiError> {
        Ok(self.0)
    }
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

pub async fn insert_job(db: &DatabaseConnection, user_id: Uuid, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    job::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        title: Set(title.to_string()),
        created_at_utc: Set(at(1, 8)),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn insert_task(
    db: &DatabaseConnection,
    job_id: Uuid,
    title: &str,
    status: TaskItemStatus,
    created_at_utc: NaiveDateTime,
) -> Uuid {
    let id = Uuid::new_v4();
    task_item::ActiveModel {
        id: Set(id),
        job_id: Set(job_id),
        title: Set(title.to_string()),
        description: Set(format!("{title} description")),
        status: Set(status),
        created_at_utc: Set(created_at_utc),
        created_by: Set("seed".to_string()),
        modified_at_utc: Set(None),
        modified_by: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub struct Migrator;

#[async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateJobTable), Box::new(CreateTaskItemTable)]
    }
}

pub struct CreateJobTable;

impl MigrationName for CreateJobTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_job_table"
    }
}

#[async_trait]
impl MigrationTrait for CreateJobTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Jobs::Table)
            .if_not_exists()
            .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Jobs::UserId).uuid().not_null())
            .col(ColumnDef::new(Jobs::Title).text().not_null())
            .col(ColumnDef::new(Jobs::CreatedAtUtc).date_time().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Jobs::Table).to_owned()).await?;
        Ok(())
    }
}

pub struct CreateTaskItemTable;

impl MigrationName for CreateTaskItemTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_task_item_table"
    }
}

#[async_trait]
impl MigrationTrait for CreateTaskItemTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(TaskItems::Table)
            .if_not_exists()
            .col(ColumnDef::new(TaskItems::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(TaskItems::JobId).uuid().not_null())
            .col(ColumnDef::new(TaskItems::Title).text().not_null())
            .col(ColumnDef::new(TaskItems::Description).text().not_null())
            .col(ColumnDef::new(TaskItems::Status).integer().not_null().default(0))
            .col(ColumnDef::new(TaskItems::CreatedAtUtc).date_time().not_null())
            .col(ColumnDef::new(TaskItems::CreatedBy).string().not_null())
            .col(ColumnDef::new(TaskItems::ModifiedAtUtc).date_time().null())
            .col(ColumnDef::new(TaskItems::ModifiedBy).string().null())
            .foreign_key(
                ForeignKey::create()
                    .from(TaskItems::Table, TaskItems::JobId)
                    .to(Jobs::Table, Jobs::Id),
            )
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskItems::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    UserId,
    Title,
    CreatedAtUtc,
}

#[derive(DeriveIden)]
enum TaskItems {
    Table,
    Id,
    JobId,
    Title,
    Description,
    Status,
    CreatedAtUtc,
    CreatedBy,
    ModifiedAtUtc,
    ModifiedBy,
}
