//! # taskmanager-core
//!
//! Query plumbing for the task manager API: client supplied filter
//! conditions are checked against a model's columns, turned into a
//! parameterised predicate and run through sea-orm; requests travel through
//! an in-process mediator whose pipeline logs and validates them first.
//!
//! ```rust,ignore
//! let request = TasksQuery {
//!     filter: FilterRequest {
//!         filter: vec![FilterCondition::new("Status", FilterOperator::Equals, ["4"])],
//!         sort_column: Some("Title".into()),
//!         page_size: 20,
//!         ..FilterRequest::default()
//!     },
//! };
//! let page = mediator.send(request, &CancellationToken::new()).await?;
//! ```

pub mod database;
pub mod errors;
pub mod filtering;
pub mod mediator;
pub mod models;
pub mod tasks;
pub mod validation;

pub use errors::{ApiError, FilterError};
pub use filtering::{
    ColumnMap, DynamicQuery, FilterCondition, FilterModel, FilterModelConfiguration, FilterOperator, SortExpression,
    ValueType,
};
pub use mediator::{Mediator, MediatorBuilder, Request, RequestHandler};
pub use models::{FilterRequest, PagedResponse};
pub use serde_with;
pub use validation::{ValidationError, ValidationErrors, Validator, ValidatorRegistry};
