#![allow(
    clippy::module_inception,
)]
//! # Docstore - Document Store Client
//!
//! Docstore is a small client façade over a document-oriented store. It opens
//! a connection to a store address, addresses a database and a collection by
//! name, and runs the usual CRUD operations on JSON-like documents.
//!
//! ## Key Features
//!
//! - **Typed results**: every write reports what it did through a dedicated
//!   result type
//! - **Tagged values**: documents keep the distinction between ints, longs,
//!   doubles and document ids
//! - **Scoped connections**: a connection is released exactly once, on close,
//!   on drop, or at the end of [with_connection]
//! - **Deadlines**: every collection call accepts an optional timeout
//! - **Pluggable drivers**: the façade talks to the store through the
//!   [driver] seam; an in-memory driver ships with the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore::client::Client;
//! use docstore::collection::return_updated;
//! use docstore::doc;
//! use docstore::filter::field;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = Client::builder()
//!     .app_name("users-demo")
//!     .connect("mongodb://127.0.0.1:27017/")?;
//!
//! let users = conn.database("usersdb")?.collection("users")?;
//! users.insert_one(doc! { name: "Ivan", age: 25 })?;
//!
//! let ivan = users.find_one_and_update(
//!     field("name").eq("Ivan"),
//!     doc! { "$set": { age: 26 } },
//!     return_updated(),
//! )?;
//!
//! users.delete_many(doc! {})?;
//! conn.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - Connecting, configuration and the connection lifecycle
//! - [`collection`] - Documents, ids, collection handles and operation results
//! - [`common`] - Tagged values and shared constants
//! - [`driver`] - The store driver seam and the in-memory driver
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Equality filters
//! - [`update`] - Update operator documents

pub mod client;
pub mod collection;
pub mod common;
pub mod driver;
pub mod errors;
pub mod filter;
pub mod update;

pub use client::{with_connection, Client, ClientBuilder, Connection};
pub use collection::{Document, DocumentId};
pub use common::Value;
pub use errors::{ErrorKind, StoreError, StoreResult};

/// Opens a connection to `address` with the default configuration.
///
/// Shorthand for [Client::connect].
pub fn connect(address: &str) -> StoreResult<Connection> {
    Client::connect(address)
}
