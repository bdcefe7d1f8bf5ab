//! Documents and collection handles.
//!
//! A [Document] is an insertion-ordered map from string keys to
//! [Value](crate::common::Value)s. Every stored document carries a
//! [DocumentId] under `_id`, generated on insert when the caller does not
//! supply one.
//!
//! A [Collection] is a handle to a named collection inside a database. It
//! borrows the [Connection](crate::client::Connection) it was obtained
//! from, so it cannot outlive it.
//!
//! ```rust,ignore
//! use docstore::doc;
//! use docstore::collection::UpdateOptions;
//!
//! let conn = docstore::connect("mongodb://127.0.0.1:27017/")?;
//! let users = conn.database("usersdb")?.collection("users")?;
//!
//! let result = users.insert_one(doc! { name: "Ivan", age: 25 })?;
//! let ivan = users.find_one(doc! { age: 25 })?;
//! users.update_one(doc! { age: 34 }, doc! { "$set": { age: 35 } }, UpdateOptions::upsert())?;
//! conn.close()?;
//! ```

mod cursor;
mod document;
mod document_id;
mod options;
mod results;
mod store_collection;

pub use cursor::*;
pub use document::*;
pub use document_id::DocumentId;
pub use options::*;
pub use results::*;
pub use store_collection::*;
