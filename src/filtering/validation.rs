//! Type-directed validation of filter conditions.
//!
//! Each condition is checked against the rule set of its field's declared
//! type. Every rule set starts with the default rules (field name, operator
//! and values present) and adds the operators the type accepts plus rules on
//! the shape and parseability of the values.

use super::condition::{FilterCondition, FilterOperator, ValueType};
use super::config::ColumnMap;
use super::value::FilterValue;
use crate::validation::{ValidationError, ValidationErrors};

/// Maximum number of values a string `In` filter may carry.
pub const STRING_IN_MAX_VALUES: usize = 4;
/// Maximum length of each value in a string `In` filter.
pub const STRING_IN_MAX_VALUE_LENGTH: usize = 15;

const FIELD_NAME: &str = "FieldName";
const OPERATOR: &str = "Operator";
const VALUES: &str = "Values";

const STRING_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::Contains,
    FilterOperator::IsNull,
    FilterOperator::In,
];
const BOOL_OPERATORS: &[FilterOperator] = &[FilterOperator::Equals];
const NUMBER_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::GreaterThan,
    FilterOperator::LessThan,
    FilterOperator::Between,
    FilterOperator::In,
    FilterOperator::NotIn,
];
const DATE_TIME_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::After,
    FilterOperator::Before,
    FilterOperator::Between,
];
const GUID_OPERATORS: &[FilterOperator] = &[FilterOperator::Equals, FilterOperator::In];
const ENUM_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::In,
    FilterOperator::NotIn,
];

/// Validation result for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterValidationOutcome {
    /// The condition with its field resolved and its type set.
    pub condition: FilterCondition,
    pub errors: ValidationErrors,
}

impl FilterValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every condition against `column_map`, in order.
///
/// The returned conditions are copies of the input with `value_type` set to
/// the canonical type of the field. A field missing from the map has its name
/// cleared and is checked as a string, so the default field-name rule rejects
/// it.
#[must_use]
pub fn validate_filter_options(
    conditions: &[FilterCondition],
    column_map: &ColumnMap,
) -> Vec<FilterValidationOutcome> {
    conditions
        .iter()
        .map(|condition| {
            let mut resolved = condition.clone();
            let declared = column_map.get(&condition.field_name).unwrap_or_else(|| {
                tracing::debug!(field = %condition.field_name, "Filter field is not a known column");
                resolved.field_name.clear();
                ValueType::String
            });

            let errors = validate_condition(&resolved, declared);
            resolved.value_type = declared.canonical();

            FilterValidationOutcome {
                condition: resolved,
                errors,
            }
        })
        .collect()
}

fn validate_condition(condition: &FilterCondition, declared: ValueType) -> ValidationErrors {
    let mut errors = default_rules(condition);
    match declared {
        ValueType::String => string_rules(condition, &mut errors),
        ValueType::Bool => bool_rules(condition, &mut errors),
        ValueType::Double | ValueType::Decimal | ValueType::Int => {
            number_rules(condition, declared, &mut errors);
        }
        ValueType::DateTime => date_time_rules(condition, &mut errors),
        ValueType::Guid => guid_rules(condition, &mut errors),
        ValueType::Enum => operator_rule(condition, declared, ENUM_OPERATORS, &mut errors),
        ValueType::Other => {}
    }
    errors
}

fn default_rules(condition: &FilterCondition) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if condition.field_name.trim().is_empty() {
        errors.add(ValidationError::new(
            FIELD_NAME,
            "Default Filter Validation failed as Field Name was empty.",
        ));
    }
    if condition.operator == FilterOperator::None {
        errors.add(ValidationError::new(
            OPERATOR,
            "Default Filter Validation failed as Operator was empty.",
        ));
        errors.add(ValidationError::new(
            OPERATOR,
            "Default Filter Validation failed as Operator returned Operator.None.",
        ));
    }
    if condition.operator != FilterOperator::IsNull && condition.values.is_empty() {
        errors.add(ValidationError::new(
            VALUES,
            "Default Filter Validation failed as Values was empty.",
        ));
    }
    errors
}

fn operator_rule(
    condition: &FilterCondition,
    declared: ValueType,
    accepted: &[FilterOperator],
    errors: &mut ValidationErrors,
) {
    if !accepted.contains(&condition.operator) {
        errors.add(ValidationError::new(
            OPERATOR,
            format!(
                "{} Filter Validation failed as Operator '{}' is not an accepted Operator.",
                declared.label(),
                condition.operator
            ),
        ));
    }
}

fn string_rules(condition: &FilterCondition, errors: &mut ValidationErrors) {
    operator_rule(condition, ValueType::String, STRING_OPERATORS, errors);
    if condition.operator != FilterOperator::In {
        return;
    }

    let too_many = condition.values.len() > STRING_IN_MAX_VALUES;
    let too_long = condition
        .values
        .iter()
        .any(|v| v.chars().count() > STRING_IN_MAX_VALUE_LENGTH);
    if too_many || too_long {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "String Filter Validation failed as one or more of the Values '{}' exceeded the expected character limit of {STRING_IN_MAX_VALUE_LENGTH} characters or the number of user values provided exceeded {STRING_IN_MAX_VALUES}.",
                joined(&condition.values)
            ),
        ));
    }
    if condition.values.iter().any(|v| v.contains(['!', '='])) {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "String Filter Validation failed as one or more of the Values '{}' contains invalid characters.",
                joined(&condition.values)
            ),
        ));
    }
}

fn bool_rules(condition: &FilterCondition, errors: &mut ValidationErrors) {
    operator_rule(condition, ValueType::Bool, BOOL_OPERATORS, errors);
    first_value_rule(condition, ValueType::Bool, errors);
}

fn number_rules(condition: &FilterCondition, declared: ValueType, errors: &mut ValidationErrors) {
    operator_rule(condition, declared, NUMBER_OPERATORS, errors);
    match condition.operator {
        FilterOperator::Between => between_rules(condition, declared, errors),
        FilterOperator::In | FilterOperator::NotIn => all_values_rule(condition, declared, errors),
        _ => first_value_rule(condition, declared, errors),
    }
}

fn date_time_rules(condition: &FilterCondition, errors: &mut ValidationErrors) {
    operator_rule(condition, ValueType::DateTime, DATE_TIME_OPERATORS, errors);
    if condition.operator == FilterOperator::Between {
        between_rules(condition, ValueType::DateTime, errors);
    } else {
        first_value_rule(condition, ValueType::DateTime, errors);
    }
}

fn guid_rules(condition: &FilterCondition, errors: &mut ValidationErrors) {
    operator_rule(condition, ValueType::Guid, GUID_OPERATORS, errors);
    match condition.operator {
        FilterOperator::Equals => first_value_rule(condition, ValueType::Guid, errors),
        FilterOperator::In => all_values_rule(condition, ValueType::Guid, errors),
        _ => {}
    }
}

/// The first value must convert; a missing value is already reported by the
/// default rules.
fn first_value_rule(condition: &FilterCondition, value_type: ValueType, errors: &mut ValidationErrors) {
    if let Some(first) = condition.values.first()
        && !FilterValue::is_parseable(first, value_type)
    {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "{label} Filter Validation failed as Values '{}' cannot be converted to {label}.",
                joined(&condition.values),
                label = value_type.label()
            ),
        ));
    }
}

fn between_rules(condition: &FilterCondition, value_type: ValueType, errors: &mut ValidationErrors) {
    let label = value_type.label();
    if condition.values.len() != 2 {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "{label} Filter Validation failed as only one Values '{}' was provided for Between Operator.",
                joined(&condition.values)
            ),
        ));
    }
    if condition.values.len() != 2 || !all_parseable(&condition.values, value_type) {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "{label} Filter Validation failed as either one or both of the Values '{}' cannot be converted to {label}.",
                joined(&condition.values)
            ),
        ));
    }
}

fn all_values_rule(condition: &FilterCondition, value_type: ValueType, errors: &mut ValidationErrors) {
    if !all_parseable(&condition.values, value_type) {
        errors.add(ValidationError::new(
            VALUES,
            format!(
                "{label} Filter Validation failed as one or more of the Values '{}' cannot be converted to {label}.",
                joined(&condition.values),
                label = value_type.label()
            ),
        ));
    }
}

fn all_parseable(values: &[String], value_type: ValueType) -> bool {
    values.iter().all(|v| FilterValue::is_parseable(v, value_type))
}

fn joined(values: &[String]) -> String {
    values.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_map() -> ColumnMap {
        [
            ("Title", ValueType::String),
            ("IsActive", ValueType::Bool),
            ("DueDate", ValueType::DateTime),
            ("Score", ValueType::Double),
            ("Price", ValueType::Decimal),
            ("Age", ValueType::Int),
            ("Id", ValueType::Guid),
            ("Status", ValueType::Enum),
            ("Job.Owner", ValueType::Other),
        ]
        .into_iter()
        .collect()
    }

    fn validate_one(condition: FilterCondition) -> FilterValidationOutcome {
        validate_filter_options(&[condition], &column_map()).remove(0)
    }

    fn messages(outcome: &FilterValidationOutcome) -> Vec<&str> {
        outcome.errors.errors().iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_unknown_field_is_cleared_and_rejected() {
        let input = FilterCondition::new("Nope", FilterOperator::Equals, ["x"]).with_type(ValueType::Int);
        let outcome = validate_one(input.clone());

        assert!(!outcome.is_valid());
        assert_eq!(outcome.condition.field_name, "");
        assert_eq!(outcome.condition.value_type, ValueType::String);
        assert_eq!(
            messages(&outcome),
            vec!["Default Filter Validation failed as Field Name was empty."]
        );
        assert_eq!(outcome.errors.errors()[0].field, "FieldName");
        // the caller's condition is untouched
        assert_eq!(input.field_name, "Nope");
    }

    #[test]
    fn test_none_operator_is_always_rejected() {
        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::None, ["x"]));
        let messages = messages(&outcome);

        assert!(messages.contains(&"Default Filter Validation failed as Operator was empty."));
        assert!(messages.contains(&"Default Filter Validation failed as Operator returned Operator.None."));
        assert!(messages.contains(&"String Filter Validation failed as Operator 'None' is not an accepted Operator."));
    }

    #[test]
    fn test_values_required_except_for_is_null() {
        let empty: [&str; 0] = [];
        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::Equals, empty));
        assert_eq!(
            messages(&outcome),
            vec!["Default Filter Validation failed as Values was empty."]
        );

        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::IsNull, empty));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_operator_matrix() {
        let accepted: [(&str, &str, &[FilterOperator]); 8] = [
            ("Title", "abc", STRING_OPERATORS),
            ("IsActive", "true", BOOL_OPERATORS),
            ("DueDate", "2024-01-01", DATE_TIME_OPERATORS),
            ("Score", "1.5", NUMBER_OPERATORS),
            ("Price", "10.25", NUMBER_OPERATORS),
            ("Age", "42", NUMBER_OPERATORS),
            ("Id", "3f2504e0-4f89-11d3-9a0c-0305e82c3301", GUID_OPERATORS),
            ("Status", "1", ENUM_OPERATORS),
        ];

        for (field, value, valid_ops) in accepted {
            for op in FilterOperator::ALL {
                let values: Vec<&str> = if op == FilterOperator::Between {
                    vec![value, value]
                } else {
                    vec![value]
                };
                let outcome = validate_one(FilterCondition::new(field, op, values));
                let operator_rejected = outcome
                    .errors
                    .errors()
                    .iter()
                    .any(|e| e.field == "Operator");

                assert_eq!(
                    operator_rejected,
                    !valid_ops.contains(&op),
                    "{field} with {op}: {:?}",
                    outcome.errors
                );
            }
        }
    }

    #[test]
    fn test_bool_rejects_comparison_operator() {
        let outcome = validate_one(FilterCondition::new("IsActive", FilterOperator::GreaterThan, ["1"]));

        assert!(!outcome.is_valid());
        let messages = messages(&outcome);
        assert!(messages.contains(&"Bool Filter Validation failed as Operator 'GreaterThan' is not an accepted Operator."));
        assert!(messages.contains(&"Bool Filter Validation failed as Values '1' cannot be converted to Bool."));
    }

    #[test]
    fn test_int_equals_resolves_type() {
        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::Equals, ["42"]));

        assert!(outcome.is_valid());
        assert_eq!(outcome.condition.value_type, ValueType::Int);
    }

    #[test]
    fn test_int_rejects_value_outside_32_bits() {
        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::Equals, ["3000000000"]));
        assert_eq!(
            messages(&outcome),
            vec!["Int Filter Validation failed as Values '3000000000' cannot be converted to Int."]
        );

        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::Equals, ["-2147483648"]));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_enum_resolves_to_int_and_only_checks_operator() {
        let outcome = validate_one(FilterCondition::new("Status", FilterOperator::Equals, ["4"]));
        assert!(outcome.is_valid());
        assert_eq!(outcome.condition.value_type, ValueType::Int);

        let outcome = validate_one(FilterCondition::new("Status", FilterOperator::GreaterThan, ["4"]));
        assert_eq!(
            messages(&outcome),
            vec!["Enum Filter Validation failed as Operator 'GreaterThan' is not an accepted Operator."]
        );
    }

    #[test]
    fn test_between_requires_two_values() {
        for field in ["Age", "DueDate"] {
            let outcome = validate_one(FilterCondition::new(field, FilterOperator::Between, ["1"]));
            assert!(!outcome.is_valid(), "{field}");
            assert!(
                messages(&outcome)
                    .iter()
                    .any(|m| m.contains("was provided for Between Operator")),
                "{field}"
            );

            let outcome = validate_one(FilterCondition::new(field, FilterOperator::Between, ["1", "2", "3"]));
            assert!(!outcome.is_valid(), "{field}");
        }

        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::Between, ["1", "9"]));
        assert!(outcome.is_valid());

        let outcome = validate_one(FilterCondition::new("DueDate", FilterOperator::Between, ["2024-01-01", "2024-02-01"]));
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_between_rejects_unparseable_bound() {
        let outcome = validate_one(FilterCondition::new("Price", FilterOperator::Between, ["1", "ten"]));
        assert_eq!(
            messages(&outcome),
            vec!["Decimal Filter Validation failed as either one or both of the Values '1, ten' cannot be converted to Decimal."]
        );
    }

    #[test]
    fn test_number_in_requires_every_value_to_parse() {
        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::NotIn, ["1", "2"]));
        assert!(outcome.is_valid());

        let outcome = validate_one(FilterCondition::new("Age", FilterOperator::In, ["1", "two"]));
        assert_eq!(
            messages(&outcome),
            vec!["Int Filter Validation failed as one or more of the Values '1, two' cannot be converted to Int."]
        );
    }

    #[test]
    fn test_single_number_must_parse() {
        let outcome = validate_one(FilterCondition::new("Score", FilterOperator::GreaterThan, ["high"]));
        assert_eq!(
            messages(&outcome),
            vec!["Double Filter Validation failed as Values 'high' cannot be converted to Double."]
        );
    }

    #[test]
    fn test_date_time_single_value() {
        let outcome = validate_one(FilterCondition::new("DueDate", FilterOperator::Before, ["2024-05-01T10:00:00"]));
        assert!(outcome.is_valid());
        assert_eq!(outcome.condition.value_type, ValueType::DateTime);

        let outcome = validate_one(FilterCondition::new("DueDate", FilterOperator::After, ["tomorrow"]));
        assert!(!outcome.is_valid());
    }

    #[test]
    fn test_guid_rules() {
        let id = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
        assert!(validate_one(FilterCondition::new("Id", FilterOperator::Equals, [id])).is_valid());
        assert!(validate_one(FilterCondition::new("Id", FilterOperator::In, [id, id])).is_valid());
        assert!(!validate_one(FilterCondition::new("Id", FilterOperator::Equals, ["123"])).is_valid());
        assert!(!validate_one(FilterCondition::new("Id", FilterOperator::In, [id, "123"])).is_valid());
    }

    #[test]
    fn test_string_in_limits() {
        assert!(validate_one(FilterCondition::new("Title", FilterOperator::In, ["a", "b", "c", "d"])).is_valid());

        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::In, ["a", "b", "c", "d", "e"]));
        assert!(messages(&outcome)[0].contains("exceeded the expected character limit of 15 characters"));

        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::In, ["sixteen chars!!!"]));
        assert_eq!(outcome.errors.len(), 2);

        let outcome = validate_one(FilterCondition::new("Title", FilterOperator::In, ["ok", "a=b"]));
        assert_eq!(
            messages(&outcome),
            vec!["String Filter Validation failed as one or more of the Values 'ok, a=b' contains invalid characters."]
        );
    }

    #[test]
    fn test_other_type_uses_default_rules_only() {
        let outcome = validate_one(FilterCondition::new("Job.Owner", FilterOperator::GreaterThan, ["x"]));
        assert!(outcome.is_valid());
        assert_eq!(outcome.condition.value_type, ValueType::String);
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let conditions = vec![
            FilterCondition::new("Age", FilterOperator::Equals, ["1"]),
            FilterCondition::new("Missing", FilterOperator::Equals, ["1"]),
            FilterCondition::new("Title", FilterOperator::Contains, ["x"]),
        ];
        let outcomes = validate_filter_options(&conditions, &column_map());

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_valid());
        assert!(!outcomes[1].is_valid());
        assert!(outcomes[2].is_valid());
        assert_eq!(outcomes[2].condition.field_name, "Title");
    }
}
