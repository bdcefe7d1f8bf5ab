//! Update specifications.
//!
//! An update specification is a document whose top-level keys are update
//! operators:
//!
//! - `$set`: assigns fields; dotted paths create missing nested documents
//! - `$unset`: removes fields; the values given are ignored
//! - `$inc`: adds a number to a field, creating it when absent
//!
//! ```rust,ignore
//! use docstore::doc;
//! use docstore::update::UpdateSpec;
//!
//! let update = UpdateSpec::new(doc! {
//!     "$set": { age: 35, "address.city": "Lviv" },
//!     "$inc": { visits: 1 },
//!     "$unset": { nickname: "" },
//! })?;
//! ```

use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, OP_INC, OP_SET, OP_UNSET, UPDATE_OPERATORS};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Display;

/// A single field modification.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    Set { path: String, value: Value },
    Unset { path: String },
    Inc { path: String, amount: Value },
}

impl UpdateOperation {
    pub fn path(&self) -> &str {
        match self {
            UpdateOperation::Set { path, .. } => path,
            UpdateOperation::Unset { path } => path,
            UpdateOperation::Inc { path, .. } => path,
        }
    }

    fn operator(&self) -> &'static str {
        match self {
            UpdateOperation::Set { .. } => OP_SET,
            UpdateOperation::Unset { .. } => OP_UNSET,
            UpdateOperation::Inc { .. } => OP_INC,
        }
    }
}

/// A validated list of update operations, applied in order.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateSpec {
    operations: Vec<UpdateOperation>,
}

impl UpdateSpec {
    /// Parses and validates an update document.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the document is empty, has a key that
    /// is not a supported operator, an operator argument that is not a
    /// non-empty document, touches `_id`, names the same path twice (or a
    /// path and one of its parents), or gives `$inc` a non-numeric amount.
    pub fn new(document: Document) -> StoreResult<UpdateSpec> {
        if document.is_empty() {
            return Err(validation_error("Update document cannot be empty"));
        }

        let mut operations = Vec::new();
        for (operator, argument) in document {
            if !operator.starts_with('$') {
                return Err(validation_error(&format!(
                    "Update document must contain only update operators, found {:?}",
                    operator
                )));
            }

            if !UPDATE_OPERATORS.contains(&operator.as_str()) {
                return Err(validation_error(&format!(
                    "Unknown update operator {}",
                    operator
                )));
            }

            let fields = match argument {
                Value::Document(fields) if !fields.is_empty() => fields,
                Value::Document(_) => {
                    return Err(validation_error(&format!(
                        "Argument of {} cannot be empty",
                        operator
                    )))
                }
                other => {
                    return Err(validation_error(&format!(
                        "Argument of {} must be a document, found {}",
                        operator,
                        other.type_name()
                    )))
                }
            };

            for (path, value) in fields {
                operations.push(UpdateSpec::operation(&operator, path, value)?);
            }
        }

        let spec = UpdateSpec { operations };
        spec.check_conflicts()?;
        Ok(spec)
    }

    /// Creates a specification holding a single `$set`.
    pub fn set<T: Into<Value>>(path: &str, value: T) -> StoreResult<UpdateSpec> {
        let mut fields = Document::new();
        fields.put(path, value)?;
        let mut document = Document::new();
        document.put(OP_SET, fields)?;
        UpdateSpec::new(document)
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    /// Applies the operations to `document` in order.
    ///
    /// Returns whether the document changed. On error the document may be
    /// partially updated, so callers apply to a copy.
    ///
    /// # Errors
    ///
    /// Returns a [ErrorKind::WriteError] if a `$set` path runs through a
    /// non-document value, or `$inc` targets a non-numeric value or
    /// overflows.
    pub fn apply(&self, document: &mut Document) -> StoreResult<bool> {
        let mut modified = false;
        for operation in self.operations.iter() {
            modified |= match operation {
                UpdateOperation::Set { path, value } => {
                    let unchanged = document
                        .get_path(path)
                        .map(|current| same_value(current, value))
                        .unwrap_or(false);
                    if !unchanged {
                        document.put_path(path, value.clone())?;
                    }
                    !unchanged
                }
                UpdateOperation::Unset { path } => document.remove_path(path).is_some(),
                UpdateOperation::Inc { path, amount } => apply_inc(document, path, amount)?,
            };
        }
        Ok(modified)
    }

    fn operation(operator: &str, path: String, value: Value) -> StoreResult<UpdateOperation> {
        if path.split(FIELD_SEPARATOR).any(|segment| segment.is_empty()) {
            return Err(validation_error(&format!(
                "Invalid field path {:?} in {}",
                path, operator
            )));
        }

        let root = path.split(FIELD_SEPARATOR).next().unwrap_or_default();
        if root == DOC_ID {
            return Err(validation_error(&format!(
                "Field {} cannot be modified by {}",
                DOC_ID, operator
            )));
        }

        if path.starts_with('$') || contains_operator_key(&value) {
            return Err(validation_error(&format!(
                "Field names starting with '$' are not allowed in {}",
                operator
            )));
        }

        match operator {
            OP_SET => Ok(UpdateOperation::Set { path, value }),
            OP_UNSET => Ok(UpdateOperation::Unset { path }),
            _ => {
                if !value.is_number() {
                    return Err(validation_error(&format!(
                        "Cannot increment {} with non-numeric argument of type {}",
                        path,
                        value.type_name()
                    )));
                }
                Ok(UpdateOperation::Inc {
                    path,
                    amount: value,
                })
            }
        }
    }

    fn check_conflicts(&self) -> StoreResult<()> {
        for (i, first) in self.operations.iter().enumerate() {
            for second in self.operations.iter().skip(i + 1) {
                let a = first.path();
                let b = second.path();
                if a == b || is_parent(a, b) || is_parent(b, a) {
                    return Err(validation_error(&format!(
                        "Updating the path {:?} would create a conflict at {:?}",
                        b, a
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Serialize for UpdateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut grouped: Vec<(&str, Vec<(&str, Value)>)> = Vec::new();
        for operation in self.operations.iter() {
            let value = match operation {
                UpdateOperation::Set { value, .. } => value.clone(),
                UpdateOperation::Unset { .. } => Value::from(""),
                UpdateOperation::Inc { amount, .. } => amount.clone(),
            };
            match grouped.iter_mut().find(|(op, _)| *op == operation.operator()) {
                Some((_, fields)) => fields.push((operation.path(), value)),
                None => grouped.push((operation.operator(), vec![(operation.path(), value)])),
            }
        }

        let mut map = serializer.serialize_map(Some(grouped.len()))?;
        for (operator, fields) in grouped.iter() {
            let fields: Vec<(&str, &Value)> = fields.iter().map(|(p, v)| (*p, v)).collect();
            map.serialize_entry(operator, &FieldMap(&fields))?;
        }
        map.end()
    }
}

struct FieldMap<'a>(&'a [(&'a str, &'a Value)]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, value) in self.0.iter() {
            map.serialize_entry(path, value)?;
        }
        map.end()
    }
}

impl Display for UpdateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

/// Conversion into a validated [UpdateSpec].
pub trait IntoUpdate {
    fn into_update(self) -> StoreResult<UpdateSpec>;
}

impl IntoUpdate for UpdateSpec {
    fn into_update(self) -> StoreResult<UpdateSpec> {
        Ok(self)
    }
}

impl IntoUpdate for Document {
    fn into_update(self) -> StoreResult<UpdateSpec> {
        UpdateSpec::new(self)
    }
}

fn validation_error(message: &str) -> StoreError {
    log::error!("{}", message);
    StoreError::new(message, ErrorKind::ValidationError)
}

fn is_parent(parent: &str, child: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child[parent.len()..].starts_with(FIELD_SEPARATOR)
}

// stricter than Value equality: I32(35) -> F64(35.0) is a modification,
// and so is a nested document with its keys in another order
fn same_value(current: &Value, new: &Value) -> bool {
    match (current, new) {
        (Value::Document(current), Value::Document(new)) => {
            current.size() == new.size()
                && current
                    .iter()
                    .zip(new.iter())
                    .all(|((ck, cv), (nk, nv))| ck == nk && same_value(cv, nv))
        }
        (Value::Array(current), Value::Array(new)) => {
            current.len() == new.len()
                && current.iter().zip(new.iter()).all(|(c, n)| same_value(c, n))
        }
        _ => current.type_name() == new.type_name() && current == new,
    }
}

/// Checks a document for field names starting with `$` at any depth.
pub(crate) fn has_operator_key(document: &Document) -> bool {
    document
        .iter()
        .any(|(key, nested)| key.starts_with('$') || contains_operator_key(nested))
}

fn contains_operator_key(value: &Value) -> bool {
    match value {
        Value::Document(doc) => has_operator_key(doc),
        Value::Array(items) => items.iter().any(contains_operator_key),
        _ => false,
    }
}

fn apply_inc(document: &mut Document, path: &str, amount: &Value) -> StoreResult<bool> {
    let current = match document.get_path(path) {
        Some(current) => current,
        None => {
            document.put_path(path, amount.clone())?;
            return Ok(true);
        }
    };

    if !current.is_number() {
        log::error!("Cannot apply $inc to {} of non-numeric type {}", path, current.type_name());
        return Err(StoreError::new(
            &format!(
                "Cannot apply $inc to {} of non-numeric type {}",
                path,
                current.type_name()
            ),
            ErrorKind::WriteError,
        ));
    }

    let sum = current.checked_add(amount).ok_or_else(|| {
        log::error!("Integer overflow applying $inc to {}", path);
        StoreError::new(
            &format!("Integer overflow applying $inc to {}", path),
            ErrorKind::WriteError,
        )
    })?;

    if same_value(current, &sum) {
        return Ok(false);
    }
    document.put_path(path, sum)?;
    Ok(true)
}
