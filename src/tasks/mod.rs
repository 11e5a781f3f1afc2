//! # Task Lists
//!
//! The filtered, sorted and paged task list of the signed-in user.
//!
//! ```rust,ignore
//! let mut validators = ValidatorRegistry::new();
//! tasks::register_validators(&mut validators);
//!
//! let handler = TasksQueryHandler::new(
//!     Arc::new(FilterModelConfiguration::new()),
//!     Arc::new(JwtCurrentUser::from(&parts)),
//!     Arc::new(SeaOrmTaskItemRepository::new(db.clone())),
//! );
//! let mediator = tasks::register_handlers(Mediator::builder().with_validators(validators), handler).build();
//! ```

pub mod entity;
pub mod projection;
pub mod query;
pub mod repository;

pub use projection::{TaskItemDto, TaskItemProjection, TaskItemStatus};
pub use query::{CurrentUser, MAX_PAGE_SIZE, TasksQuery, TasksQueryHandler, TasksQueryValidator};
pub use repository::{SeaOrmTaskItemRepository, TaskItemRepository};

use crate::mediator::{LoggingBehavior, MediatorBuilder};
use crate::validation::ValidatorRegistry;

pub fn register_validators(registry: &mut ValidatorRegistry) {
    registry.register::<TasksQuery, _>(TasksQueryValidator);
}

/// Add the task list pipeline: logging, then validation, then `handler`.
///
/// Validators must already be on `builder` (see
/// [`MediatorBuilder::with_validators`]).
#[must_use]
pub fn register_handlers(builder: MediatorBuilder, handler: TasksQueryHandler) -> MediatorBuilder {
    builder
        .behavior::<TasksQuery, _>(LoggingBehavior::new())
        .with_validation::<TasksQuery>()
        .handler::<TasksQuery, _>(handler)
}
