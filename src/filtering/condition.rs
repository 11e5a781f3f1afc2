use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::errors::FilterError;

/// Comparison applied by a [`FilterCondition`].
///
/// Clients send the integer code; the codes are part of the wire contract and
/// must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum FilterOperator {
    #[default]
    None,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    NotIn,
    Before,
    After,
    Between,
    IsNull,
    Contains,
}

impl FilterOperator {
    pub const ALL: [Self; 14] = [
        Self::None,
        Self::Equals,
        Self::NotEquals,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::In,
        Self::NotIn,
        Self::Before,
        Self::After,
        Self::Between,
        Self::IsNull,
        Self::Contains,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Equals => 1,
            Self::NotEquals => 2,
            Self::LessThan => 3,
            Self::LessThanOrEqual => 4,
            Self::GreaterThan => 5,
            Self::GreaterThanOrEqual => 6,
            Self::In => 7,
            Self::NotIn => 8,
            Self::Before => 9,
            Self::After => 10,
            Self::Between => 11,
            Self::IsNull => 50,
            Self::Contains => 99,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Equals => "Equals",
            Self::NotEquals => "NotEquals",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Before => "Before",
            Self::After => "After",
            Self::Between => "Between",
            Self::IsNull => "IsNull",
            Self::Contains => "Contains",
        }
    }
}

impl TryFrom<i32> for FilterOperator {
    type Error = FilterError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or_else(|| FilterError::new(format!("Unknown filter operator code {code}.")))
    }
}

impl From<FilterOperator> for i32 {
    fn from(op: FilterOperator) -> Self {
        op.code()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a filterable field.
///
/// Resolved once when the column map is built; `Enum` and `Other` only exist
/// at that level and are narrowed by [`ValueType::canonical`] before a
/// condition reaches the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    String,
    Bool,
    DateTime,
    Double,
    Decimal,
    Int,
    Guid,
    /// Integer-backed enumeration
    Enum,
    /// Anything without a dedicated rule set
    Other,
}

impl ValueType {
    /// Type the parser coerces values to. Enums travel as their integer value.
    #[must_use]
    pub const fn canonical(self) -> Self {
        match self {
            Self::Enum => Self::Int,
            Self::Other => Self::String,
            other => other,
        }
    }

    /// Name used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Bool => "Bool",
            Self::DateTime => "DateTime",
            Self::Double => "Double",
            Self::Decimal => "Decimal",
            Self::Int => "Int",
            Self::Guid => "Guid",
            Self::Enum => "Enum",
            Self::Other => "Default",
        }
    }
}

/// One user-supplied constraint: field, operator and raw values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    #[schema(value_type = i32)]
    pub operator: FilterOperator,
    #[serde(default)]
    pub values: Vec<String>,
    /// Resolved during validation; never taken from the client.
    #[serde(skip)]
    pub value_type: ValueType,
}

impl FilterCondition {
    pub fn new<I, S>(field_name: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_name: field_name.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            value_type: ValueType::String,
        }
    }

    #[must_use]
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_codes_are_wire_stable() {
        let expected = [
            (FilterOperator::None, 0),
            (FilterOperator::Equals, 1),
            (FilterOperator::NotEquals, 2),
            (FilterOperator::LessThan, 3),
            (FilterOperator::LessThanOrEqual, 4),
            (FilterOperator::GreaterThan, 5),
            (FilterOperator::GreaterThanOrEqual, 6),
            (FilterOperator::In, 7),
            (FilterOperator::NotIn, 8),
            (FilterOperator::Before, 9),
            (FilterOperator::After, 10),
            (FilterOperator::Between, 11),
            (FilterOperator::IsNull, 50),
            (FilterOperator::Contains, 99),
        ];
        for (op, code) in expected {
            assert_eq!(op.code(), code);
            assert_eq!(FilterOperator::try_from(code).ok(), Some(op));
        }
        assert!(FilterOperator::try_from(12).is_err());
    }

    #[test]
    fn test_condition_deserializes_from_camel_case_json() {
        let json = r#"{"fieldName":"Status","operator":7,"values":["1","2"]}"#;
        let condition: FilterCondition = serde_json::from_str(json).unwrap();

        assert_eq!(condition.field_name, "Status");
        assert_eq!(condition.operator, FilterOperator::In);
        assert_eq!(condition.values, vec!["1", "2"]);
        assert_eq!(condition.value_type, ValueType::String);
    }

    #[test]
    fn test_condition_rejects_unknown_operator_code() {
        let json = r#"{"fieldName":"Title","operator":42,"values":["x"]}"#;
        assert!(serde_json::from_str::<FilterCondition>(json).is_err());
    }

    #[test]
    fn test_resolved_type_is_not_serialized() {
        let condition = FilterCondition::new("Title", FilterOperator::Contains, ["abc"])
            .with_type(ValueType::Guid);
        let json = serde_json::to_value(&condition).unwrap();

        assert_eq!(json["operator"], 99);
        assert!(json.get("valueType").is_none());
    }

    #[test]
    fn test_enum_and_other_narrow_to_parser_types() {
        assert_eq!(ValueType::Enum.canonical(), ValueType::Int);
        assert_eq!(ValueType::Other.canonical(), ValueType::String);
        assert_eq!(ValueType::Decimal.canonical(), ValueType::Decimal);
    }
}
