//! Compiles validated filter conditions into a predicate over positional
//! placeholders plus the typed values bound to them.
//!
//! The predicate is a conjunction of clauses. Its `Display` form is the
//! textual query (`Age == @0 AND Title.Contains(@1)`); persistence adapters
//! walk the clauses directly instead of parsing that text.

use std::collections::BTreeMap;
use std::fmt;

use super::condition::{FilterCondition, FilterOperator};
use super::value::FilterValue;
use crate::errors::FilterError;

/// Position of a bound value, rendered as `@n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placeholder(pub usize);

impl Placeholder {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// One conjunct of a [`FilterPredicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Compare {
        field: String,
        comparison: Comparison,
        value: Placeholder,
    },
    In {
        field: String,
        values: Vec<Placeholder>,
        negated: bool,
    },
    Between {
        field: String,
        low: Placeholder,
        high: Placeholder,
    },
    IsNull {
        field: String,
    },
    Contains {
        field: String,
        value: Placeholder,
    },
}

impl Clause {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Compare { field, .. }
            | Self::In { field, .. }
            | Self::Between { field, .. }
            | Self::IsNull { field }
            | Self::Contains { field, .. } => field,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                field,
                comparison,
                value,
            } => write!(f, "{field} {} {value}", comparison.symbol()),
            Self::In {
                field,
                values,
                negated,
            } => {
                let list = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                if *negated {
                    write!(f, "NOT ({field} IN ({list}))")
                } else {
                    write!(f, "{field} IN ({list})")
                }
            }
            Self::Between { field, low, high } => write!(f, "{field} >= {low} AND {field} <= {high}"),
            Self::IsNull { field } => write!(f, "{field} = null"),
            Self::Contains { field, value } => write!(f, "{field}.Contains({value})"),
        }
    }
}

/// Conjunction of clauses. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    clauses: Vec<Clause>,
}

impl FilterPredicate {
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Typed values indexed by placeholder position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArguments {
    values: Vec<FilterValue>,
}

impl QueryArguments {
    fn bind(&mut self, value: FilterValue) -> Placeholder {
        self.values.push(value);
        Placeholder(self.values.len() - 1)
    }

    #[must_use]
    pub fn value(&self, placeholder: Placeholder) -> Option<&FilterValue> {
        self.values.get(placeholder.0)
    }

    /// Look up a value by its placeholder name, e.g. `"@2"`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        let index = name.strip_prefix('@')?.parse::<usize>().ok()?;
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, &FilterValue)> {
        self.values.iter().enumerate().map(|(i, v)| (Placeholder(i), v))
    }

    /// The arguments keyed by placeholder name.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, FilterValue> {
        self.iter().map(|(p, v)| (p.to_string(), v.clone())).collect()
    }
}

/// Predicate plus the values its placeholders refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicQuery {
    pub predicate: FilterPredicate,
    pub arguments: QueryArguments,
}

impl DynamicQuery {
    #[must_use]
    pub fn predicate_text(&self) -> String {
        self.predicate.to_string()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }
}

/// Compile `conditions` into a [`DynamicQuery`].
///
/// Placeholders are numbered from zero across the whole list, in condition
/// order. Each raw value is coerced to the condition's resolved type.
///
/// # Errors
///
/// Returns a `FilterError` when `Between` does not carry exactly two values,
/// when a single-value operator has no value, when a value fails to convert,
/// or when the operator is `None`.
pub fn convert_to_dynamic_query(conditions: &[FilterCondition]) -> Result<DynamicQuery, FilterError> {
    let mut arguments = QueryArguments::default();
    let mut clauses = Vec::with_capacity(conditions.len());

    for condition in conditions {
        clauses.push(build_clause(condition, &mut arguments)?);
    }

    Ok(DynamicQuery {
        predicate: FilterPredicate { clauses },
        arguments,
    })
}

fn build_clause(condition: &FilterCondition, arguments: &mut QueryArguments) -> Result<Clause, FilterError> {
    let field = condition.field_name.clone();
    let compare = |comparison, arguments: &mut QueryArguments| -> Result<Clause, FilterError> {
        Ok(Clause::Compare {
            field: field.clone(),
            comparison,
            value: arguments.bind(single_value(condition)?),
        })
    };

    match condition.operator {
        FilterOperator::Equals => compare(Comparison::Eq, arguments),
        FilterOperator::NotEquals => compare(Comparison::Ne, arguments),
        FilterOperator::LessThan => compare(Comparison::Lt, arguments),
        FilterOperator::LessThanOrEqual | FilterOperator::Before => compare(Comparison::Le, arguments),
        FilterOperator::GreaterThan => compare(Comparison::Gt, arguments),
        FilterOperator::GreaterThanOrEqual | FilterOperator::After => compare(Comparison::Ge, arguments),
        FilterOperator::In | FilterOperator::NotIn => {
            if condition.values.is_empty() {
                return Err(FilterError::parsing(format!(
                    "{} operator on '{field}' requires at least one value.",
                    condition.operator
                )));
            }
            let values = condition
                .values
                .iter()
                .map(|raw| FilterValue::parse(raw, condition.value_type).map(|v| arguments.bind(v)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Clause::In {
                field,
                values,
                negated: condition.operator == FilterOperator::NotIn,
            })
        }
        FilterOperator::Between => {
            let [low, high] = condition.values.as_slice() else {
                return Err(FilterError::new("Between operator requires exactly two values."));
            };
            let low = FilterValue::parse(low, condition.value_type)?;
            let high = FilterValue::parse(high, condition.value_type)?;
            Ok(Clause::Between {
                field,
                low: arguments.bind(low),
                high: arguments.bind(high),
            })
        }
        FilterOperator::IsNull => Ok(Clause::IsNull { field }),
        FilterOperator::Contains => Ok(Clause::Contains {
            field: field.clone(),
            value: arguments.bind(single_value(condition)?),
        }),
        FilterOperator::None => Err(FilterError::parsing(format!(
            "operator None is not supported for '{field}'."
        ))),
    }
}

fn single_value(condition: &FilterCondition) -> Result<FilterValue, FilterError> {
    let raw = condition.values.first().ok_or_else(|| {
        FilterError::parsing(format!(
            "{} operator on '{}' requires a value.",
            condition.operator, condition.field_name
        ))
    })?;
    FilterValue::parse(raw, condition.value_type)
}
