//! # Dynamic Filtering
//!
//! Turns client-supplied filter conditions into a typed, parameterized query.
//!
//! ## Pipeline
//!
//! 1. [`FilterModelConfiguration`] maps every filterable field of a record
//!    shape to its [`ValueType`]. Build it once per shape.
//! 2. [`validate_filters`] checks each [`FilterCondition`] against the rule
//!    set for its field's type and resolves the type the values parse to.
//! 3. [`generate_sort_expression`] resolves the sort column, falling back to a
//!    default.
//! 4. [`parse_filters`] compiles the conditions into a [`DynamicQuery`]: a
//!    conjunction of clauses over positional placeholders (`@0`, `@1`, ...)
//!    plus the typed values bound to them.
//!
//! The [`database`](crate::database) module compiles a `DynamicQuery` into a
//! sea-orm `Condition`.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "filter": [
//!     { "fieldName": "Status", "operator": 7, "values": ["1", "2"] },
//!     { "fieldName": "CreatedAtUtc", "operator": 11, "values": ["2024-01-01", "2024-02-01"] }
//!   ],
//!   "sortColumn": "Title",
//!   "isDescending": true,
//!   "pageNumber": 0,
//!   "pageSize": 25
//! }
//! ```
//!
//! ## Operators by type
//!
//! | Type | Operators |
//! |---|---|
//! | String | Equals, Contains, IsNull, In |
//! | Bool | Equals |
//! | Double, Decimal, Int | Equals, NotEquals, GreaterThan, LessThan, Between, In, NotIn |
//! | DateTime | Equals, After, Before, Between |
//! | Guid | Equals, In |
//! | Enum | Equals, NotEquals, In, NotIn |

pub mod condition;
pub mod config;
pub mod parser;
pub mod query;
pub mod sort;
pub mod validation;
pub mod value;

// Re-export commonly used items
pub use condition::{FilterCondition, FilterOperator, ValueType};
pub use config::{ColumnMap, FieldDescriptor, FilterModel, FilterModelConfiguration};
pub use parser::{Clause, Comparison, DynamicQuery, FilterPredicate, Placeholder, QueryArguments, convert_to_dynamic_query};
pub use query::{generate_sort_expression, parse_filters, validate_filters};
pub use sort::{SortDirection, SortExpression};
pub use validation::{FilterValidationOutcome, validate_filter_options};
pub use value::FilterValue;
