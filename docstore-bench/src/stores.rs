//! Connection fixtures for benchmarks

use docstore::client::{Client, Connection};
use docstore::collection::Collection;
use docstore::driver::memory::MemoryDriver;
use docstore::errors::StoreResult;

pub const BENCH_ADDRESS: &str = "mongodb://127.0.0.1:27017/bench";
pub const BENCH_COLLECTION: &str = "bench";

/// A private in-memory store and one open connection to it.
///
/// The connection is released when the context is dropped.
pub struct BenchContext {
    driver: MemoryDriver,
    connection: Connection,
}

impl BenchContext {
    pub fn driver(&self) -> &MemoryDriver {
        &self.driver
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn collection(&self) -> StoreResult<Collection<'_>> {
        self.connection
            .default_database()?
            .collection(BENCH_COLLECTION)
    }
}

/// Connects to a fresh in-memory store.
pub fn create_memory_store() -> StoreResult<BenchContext> {
    let driver = MemoryDriver::new();
    let connection = Client::builder()
        .app_name("docstore-bench")
        .driver(driver.clone())
        .connect(BENCH_ADDRESS)?;
    log::debug!("Created benchmark store at {}", BENCH_ADDRESS);
    Ok(BenchContext { driver, connection })
}
