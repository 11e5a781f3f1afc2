//! The three steps a list query runs before touching the store: validate
//! the conditions against the model, resolve the sort, and compile the
//! predicate.

use super::condition::FilterCondition;
use super::config::FilterModelConfiguration;
use super::parser::{DynamicQuery, convert_to_dynamic_query};
use super::sort::{self, SortExpression};
use super::validation::validate_filter_options;
use crate::errors::FilterError;
use crate::validation::ValidationErrors;

/// Validate `conditions` against the model `T`.
///
/// On success returns the conditions with their types resolved, ready for
/// [`parse_filters`].
///
/// # Errors
///
/// Returns every failure of every invalid condition, in condition order.
pub fn validate_filters<T>(
    configuration: &FilterModelConfiguration<T>,
    conditions: &[FilterCondition],
) -> Result<Vec<FilterCondition>, ValidationErrors> {
    let outcomes = validate_filter_options(conditions, configuration.column_map());

    let mut errors = ValidationErrors::new();
    let mut resolved = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        errors.extend(outcome.errors);
        resolved.push(outcome.condition);
    }

    if !errors.is_empty() {
        tracing::debug!(failures = errors.len(), "Filter validation failed");
        return Err(errors);
    }
    Ok(resolved)
}

/// Sort column for the model `T`, or `default_column` when the request names
/// none or names a column the model does not have.
#[must_use]
pub fn generate_sort_expression<T>(
    configuration: &FilterModelConfiguration<T>,
    sort_column: Option<&str>,
    is_descending: bool,
    default_column: &str,
) -> SortExpression {
    sort::generate_sort_expression(configuration.column_map(), sort_column, is_descending, default_column)
}

/// Compile validated conditions into a predicate and its arguments.
///
/// # Errors
///
/// See [`convert_to_dynamic_query`].
pub fn parse_filters(conditions: &[FilterCondition]) -> Result<DynamicQuery, FilterError> {
    convert_to_dynamic_query(conditions)
}
