//! Validation Support
//!
//! Field-level validation errors shared by the filter engine and the request
//! pipeline, plus the async [`Validator`] trait that requests register with a
//! [`ValidatorRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use taskmanager_core::validation::{ValidationErrors, Validator, validators};
//!
//! struct CreateJobValidator;
//!
//! #[async_trait]
//! impl Validator<CreateJob> for CreateJobValidator {
//!     async fn validate(&self, request: &CreateJob, _cancel: &CancellationToken) -> ValidationErrors {
//!         let mut errors = ValidationErrors::new();
//!         errors.check(validators::validate_length("Title", &request.title, Some(1), Some(200)));
//!         errors
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors, kept in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a failed single-field check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.add(error);
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Messages grouped by field name, in field order.
    #[must_use]
    pub fn grouped(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }

    /// Convert to Result
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Asynchronous precondition check for a request type.
///
/// Validators are read-only: the validation stage runs all validators for a
/// request concurrently and merges every error they report.
#[async_trait]
pub trait Validator<R>: Send + Sync {
    /// Return every failure found; an empty collection means the request is valid.
    async fn validate(&self, request: &R, cancel: &CancellationToken) -> ValidationErrors;
}

/// Validators keyed by the request type they check.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R, V>(&mut self, validator: V)
    where
        R: 'static,
        V: Validator<R> + 'static,
    {
        let entry = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Validator<R>>>::new()));
        if let Some(list) = entry.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            list.push(Arc::new(validator));
        }
    }

    /// All validators registered for `R`, in registration order.
    #[must_use]
    pub fn validators_for<R: 'static>(&self) -> &[Arc<dyn Validator<R>>] {
        self.validators
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.downcast_ref::<Vec<Arc<dyn Validator<R>>>>())
            .map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("request_types", &self.validators.len())
            .finish()
    }
}

/// Helper validators for common patterns
pub mod validators {
    use super::ValidationError;
    use std::fmt;

    /// Validate string length is within range
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for `field` when the length is out of range.
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min
            && len < min_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_len} characters"),
            ));
        }

        if let Some(max_len) = max
            && len > max_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_len} characters"),
            ));
        }

        Ok(())
    }

    /// Validate number is within range
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for `field` when the value is out of range.
    pub fn validate_range<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValidationError> {
        if let Some(min_val) = min
            && value < min_val
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_val}"),
            ));
        }

        if let Some(max_val) = max
            && value > max_val
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_val}"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_creation() {
        let err = ValidationError::new("Title", "Title is required");
        assert_eq!(err.field, "Title");
        assert_eq!(err.message, "Title is required");
        assert_eq!(err.to_string(), "Title: Title is required");
    }

    #[test]
    fn test_validation_errors_collection() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add(ValidationError::new("field1", "error1"));
        assert_eq!(errors.len(), 1);

        errors.check(Err(ValidationError::new("field2", "error2")));
        errors.check(Ok(()));
        assert_eq!(errors.len(), 2);

        assert!(errors.result().is_err());
    }

    #[test]
    fn test_grouped_keeps_message_order_per_field() {
        let errors: ValidationErrors = vec![
            ValidationError::new("Values", "first"),
            ValidationError::new("Operator", "bad operator"),
            ValidationError::new("Values", "second"),
        ]
        .into_iter()
        .collect();

        let grouped = errors.grouped();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Values"], vec!["first", "second"]);
        assert_eq!(grouped["Operator"], vec!["bad operator"]);
    }

    #[test]
    fn test_validate_length() {
        use validators::validate_length;

        assert!(validate_length("name", "ab", Some(3), None).is_err());
        assert!(validate_length("name", "abcdef", None, Some(5)).is_err());
        assert!(validate_length("name", "abc", Some(3), Some(5)).is_ok());
    }

    #[test]
    fn test_validate_range() {
        use validators::validate_range;

        assert!(validate_range("pageSize", 5, Some(10), None).is_err());
        assert!(validate_range("pageSize", 150, None, Some(100)).is_err());
        assert!(validate_range("pageSize", 25, Some(0), Some(100)).is_ok());
    }

    struct AlwaysFails;

    #[async_trait]
    impl Validator<String> for AlwaysFails {
        async fn validate(&self, _request: &String, _cancel: &CancellationToken) -> ValidationErrors {
            ValidationError::new("value", "always fails").into()
        }
    }

    #[test]
    fn test_registry_is_keyed_by_request_type() {
        let mut registry = ValidatorRegistry::new();
        registry.register::<String, _>(AlwaysFails);
        registry.register::<String, _>(AlwaysFails);

        assert_eq!(registry.validators_for::<String>().len(), 2);
        assert!(registry.validators_for::<u32>().is_empty());
    }
}
