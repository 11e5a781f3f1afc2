use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use super::condition::ValueType;

/// A record shape that can be filtered and sorted by field name.
///
/// Implementors list their public fields; nested record types are described
/// with [`FieldDescriptor::nested`] and are flattened one level deep.
///
/// ```rust,ignore
/// impl FilterModel for TaskItemProjection {
///     fn fields() -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::scalar("Id", ValueType::Guid),
///             FieldDescriptor::scalar("Title", ValueType::String),
///             FieldDescriptor::nested::<JobSummary>("Job"),
///         ]
///     }
/// }
/// ```
pub trait FilterModel {
    fn fields() -> Vec<FieldDescriptor>;
}

#[derive(Clone, Copy)]
enum FieldKind {
    Scalar(ValueType),
    Nested(fn() -> Vec<FieldDescriptor>),
}

/// A single public field of a [`FilterModel`].
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn scalar(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar(value_type),
        }
    }

    /// A field holding another record shape declared alongside this one.
    #[must_use]
    pub fn nested<M: FilterModel>(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Nested(M::fields),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type; a nested record has no rule set of its own.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self.kind {
            FieldKind::Scalar(value_type) => value_type,
            FieldKind::Nested(_) => ValueType::Other,
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldKind::Scalar(value_type) => f
                .debug_struct("FieldDescriptor")
                .field("name", &self.name)
                .field("value_type", &value_type)
                .finish(),
            FieldKind::Nested(_) => f
                .debug_struct("FieldDescriptor")
                .field("name", &self.name)
                .field("nested", &true)
                .finish(),
        }
    }
}

/// Field name to declared type, the lookup table behind filter validation
/// and sort column resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<String, ValueType>,
}

impl ColumnMap {
    /// Flatten `fields` into a column map. Nested records contribute
    /// `"Outer.Inner"` entries; anything deeper keeps no type information.
    #[must_use]
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        let mut columns = HashMap::new();
        for field in fields {
            match field.kind {
                FieldKind::Scalar(value_type) => {
                    columns.insert(field.name.to_string(), value_type);
                }
                FieldKind::Nested(inner_fields) => {
                    for inner in inner_fields() {
                        columns.insert(format!("{}.{}", field.name, inner.name), inner.value_type());
                    }
                }
            }
        }
        Self { columns }
    }

    #[must_use]
    pub fn get(&self, field_name: &str) -> Option<ValueType> {
        self.columns.get(field_name).copied()
    }

    #[must_use]
    pub fn contains(&self, field_name: &str) -> bool {
        self.columns.contains_key(field_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueType)> {
        self.columns.iter().map(|(name, value_type)| (name.as_str(), *value_type))
    }
}

impl<S: Into<String>> FromIterator<(S, ValueType)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (S, ValueType)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(name, value_type)| (name.into(), value_type)).collect(),
        }
    }
}

/// Column map for the filter model `T`.
///
/// Build it once at startup and share it (it is read-only and `Send + Sync`).
pub struct FilterModelConfiguration<T> {
    column_map: ColumnMap,
    _model: PhantomData<fn() -> T>,
}

impl<T: FilterModel> FilterModelConfiguration<T> {
    #[must_use]
    pub fn new() -> Self {
        let column_map = ColumnMap::from_fields(&T::fields());
        tracing::debug!(
            model = std::any::type_name::<T>(),
            columns = column_map.len(),
            "Built filter column map"
        );
        Self {
            column_map,
            _model: PhantomData,
        }
    }
}

impl<T: FilterModel> Default for FilterModelConfiguration<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FilterModelConfiguration<T> {
    #[must_use]
    pub const fn column_map(&self) -> &ColumnMap {
        &self.column_map
    }
}

impl<T> Clone for FilterModelConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            column_map: self.column_map.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FilterModelConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterModelConfiguration")
            .field("model", &std::any::type_name::<T>())
            .field("column_map", &self.column_map)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner;

    impl FilterModel for Owner {
        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::scalar("Name", ValueType::String),
                FieldDescriptor::scalar("Age", ValueType::Int),
                FieldDescriptor::nested::<Address>("Address"),
            ]
        }
    }

    struct Address;

    impl FilterModel for Address {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::scalar("City", ValueType::String)]
        }
    }

    struct Pet;

    impl FilterModel for Pet {
        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::scalar("Id", ValueType::Guid),
                FieldDescriptor::scalar("Born", ValueType::DateTime),
                FieldDescriptor::nested::<Owner>("Owner"),
            ]
        }
    }

    struct Empty;

    impl FilterModel for Empty {
        fn fields() -> Vec<FieldDescriptor> {
            Vec::new()
        }
    }

    #[test]
    fn test_scalar_fields_map_to_their_type() {
        let config = FilterModelConfiguration::<Pet>::new();
        let map = config.column_map();

        assert_eq!(map.get("Id"), Some(ValueType::Guid));
        assert_eq!(map.get("Born"), Some(ValueType::DateTime));
    }

    #[test]
    fn test_nested_fields_flatten_one_level() {
        let config = FilterModelConfiguration::<Pet>::new();
        let map = config.column_map();

        assert_eq!(map.get("Owner.Name"), Some(ValueType::String));
        assert_eq!(map.get("Owner.Age"), Some(ValueType::Int));
        // the nested record's own nested field is not expanded
        assert_eq!(map.get("Owner.Address"), Some(ValueType::Other));
        assert!(!map.contains("Owner.Address.City"));
        assert!(!map.contains("Owner"));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_empty_model_yields_empty_map() {
        let config = FilterModelConfiguration::<Empty>::default();
        assert!(config.column_map().is_empty());
    }

    #[test]
    fn test_column_map_from_iterator() {
        let map: ColumnMap = [("Age", ValueType::Int), ("IsActive", ValueType::Bool)]
            .into_iter()
            .collect();

        assert_eq!(map.get("IsActive"), Some(ValueType::Bool));
        assert_eq!(map.get("Missing"), None);
    }
}
