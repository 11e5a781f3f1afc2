use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::condition::ValueType;
use crate::errors::FilterError;

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// A raw filter value coerced to the type of the field it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Double(f64),
    Decimal(Decimal),
    Int(i64),
    Guid(Uuid),
}

impl FilterValue {
    /// Coerce `raw` to `value_type`. Surrounding whitespace is ignored for
    /// every type except `String`.
    ///
    /// # Errors
    ///
    /// Returns a `FilterError` naming the value and the target type when the
    /// text does not parse.
    pub fn parse(raw: &str, value_type: ValueType) -> Result<Self, FilterError> {
        let trimmed = raw.trim();
        let parsed = match value_type.canonical() {
            ValueType::String | ValueType::Other => Some(Self::String(raw.to_string())),
            ValueType::Bool => parse_bool(trimmed).map(Self::Bool),
            ValueType::DateTime => parse_date_time(trimmed).map(Self::DateTime),
            ValueType::Double => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Double),
            ValueType::Decimal => Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
                .map(Self::Decimal),
            ValueType::Int | ValueType::Enum => trimmed.parse::<i32>().ok().map(|v| Self::Int(v.into())),
            ValueType::Guid => Uuid::parse_str(trimmed).ok().map(Self::Guid),
        };

        parsed.ok_or_else(|| {
            FilterError::parsing(format!(
                "'{raw}' is not a valid {} value.",
                value_type.canonical().label()
            ))
        })
    }

    /// Whether `raw` coerces to `value_type`.
    #[must_use]
    pub fn is_parseable(raw: &str, value_type: ValueType) -> bool {
        Self::parse(raw, value_type).is_ok()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => write!(f, "'{v}'"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Double(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Guid(v) => write!(f, "{v}"),
        }
    }
}

impl From<FilterValue> for sea_orm::Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::String(v) => v.into(),
            FilterValue::Bool(v) => v.into(),
            FilterValue::DateTime(v) => v.into(),
            FilterValue::Double(v) => v.into(),
            FilterValue::Decimal(v) => v.into(),
            FilterValue::Int(v) => v.into(),
            FilterValue::Guid(v) => v.into(),
        }
    }
}
