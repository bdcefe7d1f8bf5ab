use crate::collection::{Document, DocumentId};
use crate::errors::StoreResult;
use serde::ser::{Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for equality with NaN equal to itself.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Represents a [Document] value.
///
/// A value is either a scalar ([Value::Null], [Value::Bool], numbers,
/// [Value::String], [Value::Id]) or a container ([Value::Array] or a nested
/// [Value::Document]). Documents carry no schema, so two documents in one
/// collection may hold different variants under the same key.
///
/// Numbers compare by magnitude across variants: `I32(25)`, `I64(25)` and
/// `F64(25.0)` are all equal.
///
/// # Usage
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let v3 = val!(true);
/// let doc = doc! { name: "Ivan", age: 25 };
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 32-bit integer value.
    I32(i32),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents an ordered sequence of values.
    Array(Vec<Value>),
    /// Represents a nested document.
    Document(Document),
    /// Represents a document identifier.
    Id(DocumentId),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_integer() && other.is_integer() {
            return self.as_integer() == other.as_integer();
        }

        if self.is_number() && other.is_number() {
            if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
                return num_eq_float(a, b);
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a new [Value] from anything that implements [`Into<Value>`].
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a new [Value::Array] from a vector of convertible values.
    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    /// Parses JSON text into a [Value].
    ///
    /// Integers that fit in an `i32` become [Value::I32], other integers
    /// [Value::I64], every other number [Value::F64]. Objects become nested
    /// documents.
    pub fn from_json(json: &str) -> StoreResult<Value> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Value::from_json_value(parsed)
    }

    pub(crate) fn from_json_value(value: serde_json::Value) -> StoreResult<Value> {
        Ok(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::I32(small),
                        Err(_) => Value::I64(i),
                    }
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json_value)
                    .collect::<StoreResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(map) => Value::Document(Document::from_json_map(map)?),
        })
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns an integer variant widened to `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any numeric variant as `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::I32(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_id(&self) -> Option<&DocumentId> {
        match self {
            Value::Id(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Value::Id(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::I32(_) | Value::I64(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::F64(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    /// Name of the variant, used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "int",
            Value::I64(_) => "long",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
            Value::Id(_) => "id",
        }
    }

    /// Takes the value out, leaving [Value::Null] in its place.
    pub fn take(&mut self) -> Value {
        std::mem::replace(self, Value::Null)
    }

    /// Adds two numeric values.
    ///
    /// Two `I32` operands stay `I32` unless the sum overflows, integers
    /// otherwise widen to `I64`, and any `F64` operand yields `F64`.
    /// Returns `None` when either side is not a number or an `I64` sum
    /// overflows.
    pub(crate) fn checked_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => Some(
                a.checked_add(*b)
                    .map(Value::I32)
                    .unwrap_or(Value::I64(*a as i64 + *b as i64)),
            ),
            (a, b) if a.is_integer() && b.is_integer() => {
                let sum = a.as_integer()?.checked_add(b.as_integer()?)?;
                Some(Value::I64(sum))
            }
            (a, b) if a.is_number() && b.is_number() => {
                Some(Value::F64(a.as_number()? + b.as_number()?))
            }
            _ => None,
        }
    }

    pub(crate) fn to_debug_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => format!("bool({})", v),
            Value::I32(v) => format!("i32({})", v),
            Value::I64(v) => format!("i64({})", v),
            Value::F64(v) => format!("f64({})", v),
            Value::String(v) => format!("string(\"{}\")", v),
            Value::Array(v) => {
                let items: Vec<String> = v.iter().map(|item| item.to_debug_string()).collect();
                format!("array([{}])", items.join(", "))
            }
            Value::Document(v) => format!("document({:?})", v),
            Value::Id(v) => format!("id(\"{}\")", v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Array(v) => serializer.collect_seq(v),
            Value::Document(v) => v.serialize(serializer),
            Value::Id(v) => v.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    #[inline]
    fn from(value: i8) -> Self {
        Value::I32(value as i32)
    }
}

impl From<u8> for Value {
    #[inline]
    fn from(value: u8) -> Self {
        Value::I32(value as i32)
    }
}

impl From<i16> for Value {
    #[inline]
    fn from(value: i16) -> Self {
        Value::I32(value as i32)
    }
}

impl From<u16> for Value {
    #[inline]
    fn from(value: u16) -> Self {
        Value::I32(value as i32)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<u32> for Value {
    #[inline]
    fn from(value: u32) -> Self {
        Value::I64(value as i64)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<DocumentId> for Value {
    fn from(value: DocumentId) -> Self {
        Value::Id(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(|v| v.into()).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// A macro to create a `Value` from a given expression.
///
/// # Examples
///
/// ```rust
/// use docstore::common::Value;
/// use docstore::val;
///
/// assert_eq!(val!(42), Value::I32(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// assert_eq!(val!(true), Value::Bool(true));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
