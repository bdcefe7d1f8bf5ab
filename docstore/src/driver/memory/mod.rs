//! In-process store driver.
//!
//! [MemoryDriver] keeps every database in memory, grouped by endpoint
//! (`host:port` of the connection string). All connections opened to the
//! same endpoint through clones of one driver see the same data, so a
//! sequence of short-lived connections behaves like a sequence of clients
//! talking to one server.
//!
//! The driver also simulates the failures a networked store produces:
//! [MemoryDriver::set_reachable] cuts every session off with a connection
//! error, and [MemoryDriver::set_latency] delays each request so deadlines
//! can expire.
//!
//! ```rust,ignore
//! use docstore::client::Client;
//! use docstore::driver::memory::MemoryDriver;
//!
//! let driver = MemoryDriver::new();
//! let conn = Client::builder()
//!     .driver(driver.clone())
//!     .connect("mongodb://127.0.0.1:27017/")?;
//! ```

mod driver;
mod session;
mod store;

pub use driver::*;
pub use session::*;
