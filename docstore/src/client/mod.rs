//! The client façade: connecting, and the connection lifecycle.
//!
//! [Client::builder] configures and opens a [Connection]. A connection hands
//! out [Database] handles, which hand out
//! [Collection](crate::collection::Collection) handles; both borrow the
//! connection. The connection is released exactly once, by
//! [Connection::close] or on drop, and [with_connection] scopes a
//! connection to a closure.

mod builder;
mod config;
mod connection;
mod connection_string;
mod database;

pub use builder::*;
pub use config::*;
pub use connection::*;
pub use connection_string::*;
pub use database::*;
