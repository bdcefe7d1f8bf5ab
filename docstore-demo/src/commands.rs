use crate::cli::{Cli, Command};
use anyhow::{bail, Context, Result};
use docstore::client::{Client, ClientBuilder, Connection};
use docstore::collection::{Collection, Document, FindOneAndUpdateOptions, UpdateOptions};
use docstore::doc;
use docstore::driver::memory::MemoryDriver;
use docstore::errors::StoreResult;
use serde::Serialize;
use std::time::Duration;

/// Database used when the address names none.
const DEFAULT_DATABASE: &str = "usersdb";

/// Runs commands against an in-process store.
///
/// Every command opens its own connection and closes it when done, so a
/// command sequence sees the effects of the ones before it.
pub struct Demo {
    driver: MemoryDriver,
    address: String,
    collection: String,
    timeout: Option<Duration>,
}

impl Demo {
    pub fn new(cli: &Cli) -> Self {
        Demo {
            driver: MemoryDriver::new(),
            address: cli.address.clone(),
            collection: cli.collection.clone(),
            timeout: cli.timeout_ms.map(Duration::from_millis),
        }
    }

    /// Inserts Ivan, Anna and Taras.
    pub fn seed(&self) -> Result<()> {
        let result = self.with_collection("seed", |users| users.insert_many(sample_users()))?;
        log::info!("Seeded {} users", result.inserted_count());
        Ok(())
    }

    /// Runs one command and returns the JSON lines it prints.
    pub fn execute(&self, command: &Command) -> Result<Vec<String>> {
        let line = match command {
            Command::InsertOne { document } => {
                let document = parse_document(document)?;
                self.json("insert_one", |users| users.insert_one(document))?
            }
            Command::InsertMany { documents } => {
                let documents = parse_documents(documents)?;
                self.json("insert_many", |users| users.insert_many(documents))?
            }
            Command::Find { filter } => {
                let filter = parse_document(filter)?;
                self.json("find", |users| users.find(filter))?
            }
            Command::FindOne { filter } => {
                let filter = parse_document(filter)?;
                self.json("find_one", |users| users.find_one(filter))?
            }
            Command::UpdateOne {
                filter,
                update,
                upsert,
            } => {
                let filter = parse_document(filter)?;
                let update = parse_document(update)?;
                self.json("update_one", |users| {
                    users.update_one(filter, update, UpdateOptions::new(*upsert))
                })?
            }
            Command::FindOneAndUpdate {
                filter,
                update,
                return_updated,
                upsert,
            } => {
                let filter = parse_document(filter)?;
                let update = parse_document(update)?;
                let options = FindOneAndUpdateOptions::new(*return_updated, *upsert);
                self.json("find_one_and_update", |users| {
                    users.find_one_and_update(filter, update, options)
                })?
            }
            Command::DeleteMany { filter } => {
                let filter = parse_document(filter)?;
                self.json("delete_many", |users| users.delete_many(filter))?
            }
            Command::Scenario => return self.scenario(),
        };
        Ok(vec![line])
    }

    /// The users walkthrough, one connection per step.
    pub fn scenario(&self) -> Result<Vec<String>> {
        Ok(vec![
            self.json("insert_one", |users| {
                users.insert_one(doc! { name: "Ivan", age: 25 })
            })?,
            self.json("insert_many", |users| users.insert_many(sample_users()))?,
            self.json("find", |users| users.find(doc! { name: "Anna", age: 24 }))?,
            self.json("find_one", |users| users.find_one(doc! { age: 25 }))?,
            self.json("update_one", |users| {
                users.update_one(
                    doc! { age: 34 },
                    doc! { "$set": { age: 35 } },
                    UpdateOptions::upsert(),
                )
            })?,
            self.json("find_one_and_update", |users| {
                users.find_one_and_update(
                    doc! { name: "Taras" },
                    doc! { "$set": { age: 45 } },
                    FindOneAndUpdateOptions::default().return_updated(true),
                )
            })?,
            self.json("delete_many", |users| users.delete_many(doc! { name: "Ivan" }))?,
        ])
    }

    fn builder(&self) -> ClientBuilder {
        Client::builder()
            .app_name("docstore-demo")
            .driver(self.driver.clone())
    }

    fn json<T, F>(&self, step: &str, body: F) -> Result<String>
    where
        T: Serialize,
        F: FnOnce(&Collection<'_>) -> StoreResult<T>,
    {
        let result = self.with_collection(step, body)?;
        serde_json::to_string(&result).with_context(|| format!("cannot encode {} result", step))
    }

    fn with_collection<T, F>(&self, step: &str, body: F) -> Result<T>
    where
        F: FnOnce(&Collection<'_>) -> StoreResult<T>,
    {
        log::info!("Running {} on {}", step, self.collection);
        let result = docstore::with_connection(self.builder(), &self.address, |conn| {
            let collection = self.collection(conn)?;
            body(&collection)
        })?;
        Ok(result)
    }

    fn collection<'a>(&self, conn: &'a Connection) -> StoreResult<Collection<'a>> {
        let database = match conn.address().default_database() {
            Some(_) => conn.default_database()?,
            None => conn.database(DEFAULT_DATABASE)?,
        };
        let collection = database.collection(&self.collection)?;
        Ok(match self.timeout {
            Some(timeout) => collection.with_timeout(timeout),
            None => collection,
        })
    }
}

fn sample_users() -> Vec<Document> {
    vec![
        doc! { name: "Ivan", age: 25 },
        doc! { name: "Anna", age: 24 },
        doc! { name: "Taras", age: 34 },
    ]
}

fn parse_document(text: &str) -> Result<Document> {
    Document::from_json(text).with_context(|| format!("invalid JSON document {}", text))
}

fn parse_documents(text: &str) -> Result<Vec<Document>> {
    let parsed: serde_json::Value =
        serde_json::from_str(text).with_context(|| format!("invalid JSON {}", text))?;
    match parsed {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| parse_document(&item.to_string()))
            .collect(),
        _ => bail!("expected a JSON array of documents, found {}", text),
    }
}
