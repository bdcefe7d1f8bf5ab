use docstore::client::{Client, ClientBuilder, Connection};
use docstore::collection::{Collection, Document};
use docstore::doc;
use docstore::driver::memory::MemoryDriver;
use docstore::errors::{ErrorKind, StoreError, StoreResult};
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;
use std::backtrace::Backtrace;
use std::thread;
use std::time::{Duration, Instant};

/// Runs a test with retry logic and error handling.
/// Tests run on the current thread to avoid thread exhaustion when running many tests in parallel.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StoreResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StoreResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => match after(ctx) {
                        Ok(_) => Ok(()),
                        Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                    },
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                last_error = Some(e.clone());
                last_backtrace = Some(bt);
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Error: {}", e);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());

                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                        attempt, MAX_RETRIES, elapsed
                    );
                    eprintln!("Panic: {}", err_msg);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
            }
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A private in-memory store plus the address and database a test works in.
///
/// Clones share the same store.
#[derive(Clone)]
pub struct TestContext {
    driver: MemoryDriver,
    address: String,
    database: String,
}

impl TestContext {
    pub fn new(driver: MemoryDriver, address: String, database: String) -> Self {
        Self {
            driver,
            address,
            database,
        }
    }

    pub fn driver(&self) -> &MemoryDriver {
        &self.driver
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// A builder wired to this context's store.
    pub fn builder(&self) -> ClientBuilder {
        Client::builder()
            .app_name("docstore-int-test")
            .driver(self.driver.clone())
    }

    pub fn connect(&self) -> StoreResult<Connection> {
        self.builder().connect(&self.address)
    }

    /// Opens a connection and runs `body` with the named collection of the
    /// test database. The connection is closed afterwards.
    pub fn with_collection<T, F>(&self, name: &str, body: F) -> StoreResult<T>
    where
        F: FnOnce(&Collection<'_>) -> StoreResult<T>,
    {
        docstore::with_connection(self.builder(), &self.address, |conn| {
            let collection = conn.database(&self.database)?.collection(name)?;
            body(&collection)
        })
    }
}

pub fn random_database() -> String {
    format!("db_{}", uuid::Uuid::new_v4().simple())
}

pub fn create_test_context() -> StoreResult<TestContext> {
    let database = random_database();
    let address = format!("mongodb://127.0.0.1:27017/{}", database);
    Ok(TestContext::new(MemoryDriver::new(), address, database))
}

/// Restores the store's fault settings and checks every connection the
/// test opened was released.
pub fn cleanup(ctx: TestContext) -> StoreResult<()> {
    ctx.driver().set_reachable(true);
    ctx.driver().set_latency(Duration::ZERO);

    let open = ctx.driver().open_sessions();
    if open != 0 {
        return Err(StoreError::new(
            &format!("{} connection(s) left open by the test", open),
            ErrorKind::InternalError,
        ));
    }
    Ok(())
}

/// The three users of the sample scenario.
pub fn create_test_docs() -> Vec<Document> {
    vec![
        doc! { name: "Ivan", age: 25 },
        doc! { name: "Anna", age: 24 },
        doc! { name: "Taras", age: 34 },
    ]
}

pub fn insert_test_documents(collection: &Collection<'_>) -> StoreResult<()> {
    collection.insert_many(create_test_docs())?;
    Ok(())
}

/// A user with generated names, a unique email and a random age.
pub fn random_user() -> Document {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let email = format!(
        "{}.{}",
        uuid::Uuid::new_v4().simple(),
        FreeEmail().fake::<String>()
    );
    let age: i32 = rand::thread_rng().gen_range(18..90);

    doc! {
        first_name: first_name,
        last_name: last_name,
        email: email,
        age: age,
    }
}

pub fn random_users(count: usize) -> Vec<Document> {
    (0..count).map(|_| random_user()).collect()
}

/// Strips `_id` so a stored document can be compared with its input.
pub fn without_id(document: &Document) -> Document {
    let mut document = document.clone();
    document.remove("_id");
    document
}
