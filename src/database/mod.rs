//! sea-orm adapter for compiled filters.
//!
//! A [`DynamicQuery`] names fields by their logical name. Repositories map
//! each name to a column expression with a registry slice, e.g.
//! `&[("Title", Expr::col((task_item::Entity, task_item::Column::Title)).into())]`,
//! and this module turns clauses, placeholders and sort expressions into
//! sea-query conditions and `ORDER BY` terms.

use sea_orm::{
    Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};

use crate::errors::FilterError;
use crate::filtering::{Clause, Comparison, DynamicQuery, FilterValue, Placeholder, QueryArguments, SortExpression};
use crate::models::{PageWindow, PagedResponse};

/// Largest row limit every supported backend accepts.
const NO_LIMIT: u64 = 0x7fff_ffff_ffff_ffff;

/// Escape LIKE wildcards so user text only matches literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn column(columns: &[(&str, SimpleExpr)], field: &str) -> Result<Expr, FilterError> {
    columns
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, expr)| Expr::expr(expr.clone()))
        .ok_or_else(|| FilterError::new(format!("Field '{field}' cannot be filtered.")))
}

fn argument(arguments: &QueryArguments, placeholder: Placeholder) -> Result<sea_orm::Value, FilterError> {
    arguments
        .value(placeholder)
        .cloned()
        .map(sea_orm::Value::from)
        .ok_or_else(|| FilterError::new(format!("No value bound to placeholder {placeholder}.")))
}

fn comparison(column: Expr, comparison: Comparison, value: sea_orm::Value) -> SimpleExpr {
    match comparison {
        Comparison::Eq => column.eq(value),
        Comparison::Ne => column.ne(value),
        Comparison::Lt => column.lt(value),
        Comparison::Le => column.lte(value),
        Comparison::Gt => column.gt(value),
        Comparison::Ge => column.gte(value),
    }
}

fn contains(column: Expr, value: &FilterValue) -> SimpleExpr {
    let text = match value {
        FilterValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    let pattern = format!("%{}%", escape_like_wildcards(&text.to_uppercase()));
    Expr::expr(Func::upper(column)).like(LikeExpr::new(pattern).escape('\\'))
}

/// Compile `query` into a sea-orm [`Condition`] (all clauses must hold).
/// An empty query yields an empty condition, which matches every row.
///
/// # Errors
///
/// Returns a `FilterError` when a clause names a field missing from
/// `columns` or refers to a placeholder with no bound value.
pub fn build_condition(query: &DynamicQuery, columns: &[(&str, SimpleExpr)]) -> Result<Condition, FilterError> {
    let args = &query.arguments;
    let mut condition = Condition::all();

    for clause in query.predicate.clauses() {
        let col = column(columns, clause.field())?;
        condition = match clause {
            Clause::Compare {
                comparison: op,
                value,
                ..
            } => condition.add(comparison(col, *op, argument(args, *value)?)),
            Clause::In { values, negated, .. } => {
                let values = values
                    .iter()
                    .map(|p| argument(args, *p))
                    .collect::<Result<Vec<_>, _>>()?;
                if *negated {
                    condition.add(col.is_not_in(values))
                } else {
                    condition.add(col.is_in(values))
                }
            }
            Clause::Between { low, high, .. } => condition
                .add(col.clone().gte(argument(args, *low)?))
                .add(col.lte(argument(args, *high)?)),
            Clause::IsNull { .. } => condition.add(col.is_null()),
            Clause::Contains { value, .. } => {
                let bound = args
                    .value(*value)
                    .ok_or_else(|| FilterError::new(format!("No value bound to placeholder {value}.")))?;
                condition.add(contains(col, bound))
            }
        };
    }

    Ok(condition)
}

/// Order `query` by `sort`, then by `tie_break` so paging is stable.
///
/// `columns` maps sortable names to the expression to order by, which need
/// not be the stored column.
///
/// # Errors
///
/// Returns a `FilterError` when `sort` names a column missing from `columns`.
pub fn apply_sort<Q: QueryOrder>(
    query: Q,
    sort: &SortExpression,
    columns: &[(&str, SimpleExpr)],
    tie_break: SimpleExpr,
) -> Result<Q, FilterError> {
    let expr = columns
        .iter()
        .find(|(name, _)| *name == sort.column)
        .map(|(_, expr)| expr.clone())
        .ok_or_else(|| FilterError::new(format!("Column '{}' cannot be sorted.", sort.column)))?;

    let query = query.order_by(expr.clone(), sort.direction.into());
    if expr == tie_break {
        return Ok(query);
    }
    Ok(query.order_by(tie_break, sea_orm::Order::Asc))
}

/// Count the rows `select` matches, then fetch the rows inside `window`.
///
/// # Errors
///
/// Returns any database error from either query.
pub async fn fetch_page<E, M, C>(db: &C, select: Select<E>, window: PageWindow) -> Result<PagedResponse<M>, DbErr>
where
    E: EntityTrait,
    M: FromQueryResult + Send + Sync,
    C: ConnectionTrait,
{
    let total_count = select.clone().into_model::<M>().count(db).await?;

    let mut select = select;
    if window.skip > 0 || window.take.is_some() {
        select = select.limit(window.take.unwrap_or(NO_LIMIT));
    }
    if window.skip > 0 {
        select = select.offset(window.skip);
    }

    let items = select.into_model::<M>().all(db).await?;
    tracing::debug!(
        total_count,
        returned = items.len(),
        skip = window.skip,
        take = ?window.take,
        "Fetched page"
    );

    Ok(PagedResponse::new(items, total_count))
}
