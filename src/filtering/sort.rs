use sea_orm::sea_query::Order;
use std::fmt;

use super::config::ColumnMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => Order::Asc,
            SortDirection::Descending => Order::Desc,
        }
    }
}

/// Column and direction to order a result set by. Displays as `Title DESC`,
/// or just the column name when ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpression {
    pub column: String,
    pub direction: SortDirection,
}

impl SortExpression {
    #[must_use]
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Descending
    }
}

impl fmt::Display for SortExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => f.write_str(&self.column),
            SortDirection::Descending => write!(f, "{} DESC", self.column),
        }
    }
}

/// Resolve the requested sort column against `column_map`, falling back to
/// `default_column` when none was requested or the column is unknown.
#[must_use]
pub fn generate_sort_expression(
    column_map: &ColumnMap,
    requested_column: Option<&str>,
    is_descending: bool,
    default_column: &str,
) -> SortExpression {
    let column = requested_column
        .filter(|column| !column.trim().is_empty() && column_map.contains(column))
        .unwrap_or(default_column);

    SortExpression {
        column: column.to_string(),
        direction: if is_descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    }
}
