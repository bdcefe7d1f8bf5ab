//! Equality filters for selecting documents.
//!
//! A filter is a document: a stored document matches when, for every key of
//! the filter, it holds an equal value at that key. Keys may be dotted paths
//! reaching into nested documents, and a filter value matches an array field
//! when any element equals it. The empty filter matches every document.
//!
//! Operator queries (`$gt`, `$in`, ...) are not supported; a filter key or
//! nested key starting with `$` is a validation error.
//!
//! ```rust,ignore
//! use docstore::doc;
//! use docstore::filter::{all, field};
//!
//! // Filter documents, as passed to collection calls
//! let cursor = users.find(doc! { name: "Anna", age: 24 })?;
//!
//! // The same filter built fluently
//! let filter = field("name").eq("Anna").and(field("age").eq(24));
//! let cursor = users.find(filter)?;
//!
//! let everything = users.find(all())?;
//! ```

mod filter;
mod fluent;

pub use filter::*;
pub use fluent::*;
