use crate::common::Value;

use super::Filter;

/// Creates a fluent filter builder for the specified field path.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Builds an equality condition on one field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Creates a filter matching documents where the field equals `value`.
    ///
    /// Validation of the field name happens when the filter is used.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::from_condition(self.field_name, value.into())
    }
}
