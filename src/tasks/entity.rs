//! Tables read by the task list query.

pub mod job {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "jobs")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub title: String,
        pub created_at_utc: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::task_item::Entity")]
        TaskItem,
    }

    impl Related<super::task_item::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::TaskItem.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod task_item {
    use sea_orm::entity::prelude::*;

    use crate::tasks::projection::TaskItemStatus;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "task_items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub job_id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub status: TaskItemStatus,
        pub created_at_utc: DateTime,
        pub created_by: String,
        pub modified_at_utc: Option<DateTime>,
        pub modified_by: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::job::Entity",
            from = "Column::JobId",
            to = "super::job::Column::Id"
        )]
        Job,
    }

    impl Related<super::job::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Job.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
