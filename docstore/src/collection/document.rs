use indexmap::IndexMap;

use crate::collection::DocumentId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::{Debug, Display};

/// Represents a schema-less record stored in a collection.
///
/// A document is a mapping from [String] keys to [Value]s. Keys keep the
/// order in which they were first written, so a document prints its fields
/// in the order the caller built it. Equality ignores key order.
///
/// Keys are stored literally: `put("a.b", 1)` creates a key named `a.b`.
/// The `*_path` methods interpret a key as a path separated by `.`, walking
/// nested documents and, for numeric segments, array positions.
///
/// The top-level `_id` field is reserved for the document's [DocumentId].
/// If it is absent on insert, one is generated. Nested documents may use
/// `_id` freely.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of top-level entries in the document.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified key.
    ///
    /// An existing key keeps its position and gets the new value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the key is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Ivan")?;
    /// doc.put("age", 25)?;
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> StoreResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StoreError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Returns the value stored under a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes a top-level key, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the value at a dotted path.
    ///
    /// Each segment selects a key of a nested document, or a position when
    /// the current value is an array and the segment is a number.
    ///
    /// ```ignore
    /// let doc = doc!{ address: { city: "Kyiv" }, tags: ["a", "b"] };
    /// assert_eq!(doc.get_path("address.city"), Some(&Value::from("Kyiv")));
    /// assert_eq!(doc.get_path("tags.1"), Some(&Value::from("b")));
    /// ```
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(path) {
            return Some(value);
        }

        let mut splits = path.split(FIELD_SEPARATOR);
        let first = splits.next()?;
        let mut current = self.data.get(first)?;
        for segment in splits {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Checks if a top level field or embedded field exists.
    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    /// Sets the value at a dotted path, creating missing nested documents.
    ///
    /// # Errors
    ///
    /// Returns a [ErrorKind::WriteError] if a segment before the last one
    /// holds a value that is not a document (the path cannot be created), and
    /// a validation error for empty segments.
    pub fn put_path<T: Into<Value>>(&mut self, path: &str, value: T) -> StoreResult<()> {
        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        self.deep_put(path, &splits, value.into())
    }

    /// Removes the value at a dotted path. Missing paths are not an error.
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    /// Returns the `_id` of this document, if it has one.
    pub fn id(&self) -> Option<DocumentId> {
        self.data.get(DOC_ID).and_then(|v| v.as_id()).copied()
    }

    /// Checks if this document has an `_id` field.
    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Returns the document id, generating and assigning one if absent.
    ///
    /// A generated `_id` becomes the first key of the document.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `_id` is present but is not a
    /// [DocumentId].
    pub fn ensure_id(&mut self) -> StoreResult<DocumentId> {
        match self.data.get(DOC_ID) {
            Some(Value::Id(id)) => Ok(*id),
            Some(other) => {
                log::error!("Document id must be a DocumentId, found {}", other.type_name());
                Err(StoreError::new(
                    &format!("Document id must be a DocumentId, found {}", other.type_name()),
                    ErrorKind::ValidationError,
                ))
            }
            None => {
                let id = DocumentId::new();
                let mut data = IndexMap::with_capacity(self.data.len() + 1);
                data.insert(DOC_ID.to_string(), Value::Id(id));
                data.extend(std::mem::take(&mut self.data));
                self.data = data;
                Ok(id)
            }
        }
    }

    /// Retrieves all leaf field paths, embedded fields joined with `.`.
    ///
    /// `_id` is excluded.
    pub fn fields(&self) -> Vec<String> {
        self.fields_internal("")
    }

    /// Merges another document into this one.
    ///
    /// Nested documents present on both sides are merged recursively, any
    /// other value from `other` overwrites the existing one.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            if let (Some(Value::Document(existing)), Value::Document(incoming)) =
                (self.data.get_mut(key), value)
            {
                existing.merge(incoming);
                continue;
            }
            self.data.insert(key.clone(), value.clone());
        }
    }

    /// Gets an iterator over the key-value pairs in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Gets an iterator over the top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Parses a JSON object into a document.
    ///
    /// A string under the top-level `_id` must be 24 hex characters and
    /// becomes a [Value::Id]. Nested `_id` keys are read like any other field.
    ///
    /// # Errors
    ///
    /// Returns an encoding error for invalid JSON, and a validation error if
    /// the text is not a JSON object or the top-level `_id` string is not an
    /// id.
    pub fn from_json(json: &str) -> StoreResult<Document> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        match parsed {
            serde_json::Value::Object(map) => {
                let id = match map.get(DOC_ID) {
                    Some(serde_json::Value::String(text)) => Some(DocumentId::parse_str(text)?),
                    _ => None,
                };
                let mut document = Document::from_json_map(map)?;
                if let Some(id) = id {
                    document.put(DOC_ID, id)?;
                }
                Ok(document)
            }
            other => {
                log::error!("Expected a JSON object, found {}", other);
                Err(StoreError::new(
                    &format!("Expected a JSON object, found {}", other),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    pub(crate) fn from_json_map(
        map: serde_json::Map<String, serde_json::Value>,
    ) -> StoreResult<Document> {
        let mut document = Document::new();
        for (key, value) in map {
            document.put(&key, Value::from_json_value(value)?)?;
        }
        Ok(document)
    }

    /// Serializes this document as compact JSON text.
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes this document as indented JSON text.
    pub fn to_pretty_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn fields_internal(&self, prefix: &str) -> Vec<String> {
        let mut fields = Vec::new();
        for (key, value) in self.data.iter() {
            if key == DOC_ID || key.is_empty() {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    fields.extend(doc.fields_internal(&field));
                }
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, path: &str, splits: &[&str], value: Value) -> StoreResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Invalid field path {:?}", path);
                return Err(StoreError::new(
                    &format!("Invalid field path {:?}", path),
                    ErrorKind::ValidationError,
                ));
            }
        };

        if splits.len() == 1 {
            return self.put(key, value);
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_put(path, remaining, value),
            Some(Value::Array(items)) => {
                let index = remaining[0].parse::<usize>().ok();
                match index.and_then(|i| items.get_mut(i)) {
                    Some(item) if remaining.len() == 1 => {
                        *item = value;
                        Ok(())
                    }
                    Some(Value::Document(nested)) => nested.deep_put(path, &remaining[1..], value),
                    _ => Err(Document::unreachable_path(path, key)),
                }
            }
            Some(Value::Null) | None => {
                let mut nested = Document::new();
                nested.deep_put(path, remaining, value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
            Some(_) => Err(Document::unreachable_path(path, key)),
        }
    }

    fn unreachable_path(path: &str, key: &str) -> StoreError {
        log::error!("Cannot create field path {:?}: {:?} is not a document", path, key);
        StoreError::new(
            &format!("Cannot create field path {:?}: {:?} is not a document", path, key),
            ErrorKind::WriteError,
        )
    }

    fn deep_remove(&mut self, splits: &[&str]) -> Option<Value> {
        let key = *splits.first()?;
        if splits.len() == 1 {
            return self.remove(key);
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key)? {
            Value::Document(nested) => nested.deep_remove(remaining),
            Value::Array(items) => {
                let index = remaining[0].parse::<usize>().ok()?;
                if remaining.len() == 1 {
                    // positional unset leaves a null in place, the array keeps its length
                    items.get_mut(index).map(|item| item.take())
                } else {
                    match items.get_mut(index)? {
                        Value::Document(nested) => nested.deep_remove(&remaining[1..]),
                        _ => None,
                    }
                }
            }
            _ => None,
        }
    }

    pub(crate) fn to_debug_string(&self) -> String {
        let entries: Vec<String> = self
            .data
            .iter()
            .map(|(key, value)| format!("\"{}\": {}", key, value.to_debug_string()))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in self.data.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a Document with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use docstore::doc;
///
/// let empty = doc!{};
///
/// let user = doc!{
///     name: "Ivan",
///     age: 25
/// };
///
/// let update = doc!{
///     "$set": { age: 35 }
/// };
///
/// let nested = doc!{
///     name: "Anna",
///     address: { city: "Lviv" },
///     tags: ["admin", "user"],
///     score: (10 * 2)
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // match an empty document (with braces for backward compat)
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
