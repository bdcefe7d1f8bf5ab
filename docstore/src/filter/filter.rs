use crate::collection::{Document, DocumentId};
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Display;

/// An equality predicate over documents.
///
/// A filter is a list of `(path, value)` conditions; a document matches when
/// every condition holds. A condition holds when the document has a value at
/// the path that equals the expected value, or an array there with an equal
/// element. Paths walk nested documents, and fan out over arrays of
/// documents (`orders.total` checks the `total` of every order).
///
/// Filters are usually built from a [Document] with [Filter::new], or with
/// the fluent [field](crate::filter::field) builder. A missing key never
/// matches, not even a `null` condition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates a filter from a filter document.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a key is an operator (starts with `$`),
    /// has an empty path segment, or a value is an operator document such as
    /// `{"$gt": 5}`.
    pub fn new(document: Document) -> StoreResult<Filter> {
        let filter = Filter {
            conditions: document.into_iter().collect(),
        };
        filter.validate()?;
        Ok(filter)
    }

    pub(crate) fn from_condition(path: String, value: Value) -> Filter {
        Filter {
            conditions: vec![(path, value)],
        }
    }

    /// Combines this filter with another, both must hold.
    pub fn and(mut self, other: Filter) -> Filter {
        self.conditions.extend(other.conditions);
        self
    }

    /// Checks if this filter matches every document.
    pub fn is_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Checks the filter's conditions for unsupported constructs.
    pub fn validate(&self) -> StoreResult<()> {
        for (path, value) in self.conditions.iter() {
            if path.starts_with('$') {
                log::error!("Operator {} is not supported in filters", path);
                return Err(StoreError::new(
                    &format!("Operator {} is not supported in filters", path),
                    ErrorKind::ValidationError,
                ));
            }

            if path.split(FIELD_SEPARATOR).any(|segment| segment.is_empty()) {
                log::error!("Invalid filter field {:?}", path);
                return Err(StoreError::new(
                    &format!("Invalid filter field {:?}", path),
                    ErrorKind::ValidationError,
                ));
            }

            if let Some(operator) = find_operator(value) {
                log::error!("Operator {} is not supported in filter on {}", operator, path);
                return Err(StoreError::new(
                    &format!("Operator {} is not supported in filter on {}", operator, path),
                    ErrorKind::ValidationError,
                ));
            }
        }
        Ok(())
    }

    /// Checks whether `document` satisfies every condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| condition_holds(document, path, expected))
    }

    /// Builds the base document for an upsert from the equality conditions.
    ///
    /// Dotted paths become nested documents.
    pub(crate) fn seed(&self) -> StoreResult<Document> {
        let mut document = Document::new();
        for (path, value) in self.conditions.iter() {
            document.put_path(path, value.clone()).map_err(|err| {
                log::error!("Cannot build upsert document from filter field {}", path);
                StoreError::new_with_cause(
                    &format!("Cannot build upsert document from filter field {}", path),
                    ErrorKind::ValidationError,
                    err,
                )
            })?;
        }
        Ok(document)
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.conditions.len()))?;
        for (path, value) in self.conditions.iter() {
            map.serialize_entry(path, value)?;
        }
        map.end()
    }
}

/// Conversion into a validated [Filter].
///
/// Collection calls accept anything implementing it, so both a filter
/// [Document] and a [Filter] can be passed.
pub trait IntoFilter {
    fn into_filter(self) -> StoreResult<Filter>;
}

impl IntoFilter for Filter {
    fn into_filter(self) -> StoreResult<Filter> {
        self.validate()?;
        Ok(self)
    }
}

impl IntoFilter for Document {
    fn into_filter(self) -> StoreResult<Filter> {
        Filter::new(self)
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::default()
}

/// Creates a filter that matches the document with the given id.
pub fn by_id(id: DocumentId) -> Filter {
    Filter::from_condition(DOC_ID.to_string(), Value::Id(id))
}

fn find_operator(value: &Value) -> Option<&str> {
    match value {
        Value::Document(doc) => doc.iter().find_map(|(key, nested)| {
            if key.starts_with('$') {
                Some(key.as_str())
            } else {
                find_operator(nested)
            }
        }),
        Value::Array(items) => items.iter().find_map(find_operator),
        _ => None,
    }
}

fn condition_holds(document: &Document, path: &str, expected: &Value) -> bool {
    let mut candidates = Vec::new();
    match document.get(path) {
        Some(value) => candidates.push(value),
        None => {
            let segments: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
            resolve_in_document(document, &segments, &mut candidates);
        }
    }

    candidates.into_iter().any(|candidate| {
        if candidate == expected {
            return true;
        }
        match candidate {
            Value::Array(items) if !expected.is_array() => items.iter().any(|item| item == expected),
            _ => false,
        }
    })
}

fn resolve_in_document<'a>(document: &'a Document, segments: &[&str], out: &mut Vec<&'a Value>) {
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = document.get(first) {
            resolve(value, rest, out);
        }
    }
}

fn resolve<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    if segments.is_empty() {
        out.push(value);
        return;
    }

    match value {
        Value::Document(nested) => resolve_in_document(nested, segments, out),
        Value::Array(items) => {
            if let Ok(index) = segments[0].parse::<usize>() {
                if let Some(item) = items.get(index) {
                    resolve(item, &segments[1..], out);
                }
            }
            for item in items.iter().filter(|item| item.is_document()) {
                resolve(item, segments, out);
            }
        }
        _ => {}
    }
}
