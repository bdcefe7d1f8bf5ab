use crate::collection::{Document, DocumentId};
use crate::common::{Value, DOC_ID};
use crate::driver::{Namespace, UpdateMode, UpdateOutcome};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::update::UpdateSpec;
use dashmap::DashMap;
use itertools::Itertools;
use parking_lot::RwLock;
use std::sync::Arc;

/// All databases behind one `host:port`.
#[derive(Default)]
pub(crate) struct MemoryEndpoint {
    databases: DashMap<String, Arc<MemoryDatabase>>,
}

impl MemoryEndpoint {
    pub(crate) fn new() -> Self {
        MemoryEndpoint::default()
    }

    pub(crate) fn database_names(&self) -> Vec<String> {
        self.databases
            .iter()
            .filter(|entry| !entry.value().collections.is_empty())
            .map(|entry| entry.key().clone())
            .sorted()
            .collect()
    }

    pub(crate) fn collection_names(&self, database: &str) -> Vec<String> {
        match self.databases.get(database).map(|db| db.value().clone()) {
            Some(db) => db
                .collections
                .iter()
                .map(|entry| entry.key().clone())
                .sorted()
                .collect(),
            None => Vec::new(),
        }
    }

    /// The collection, if it exists. Reads never create containers.
    pub(crate) fn collection(&self, namespace: &Namespace) -> Option<Arc<MemoryCollection>> {
        let db = self
            .databases
            .get(namespace.database())
            .map(|db| db.value().clone())?;
        let collection = db
            .collections
            .get(namespace.collection())
            .map(|c| c.value().clone());
        collection
    }

    pub(crate) fn collection_or_create(&self, namespace: &Namespace) -> Arc<MemoryCollection> {
        let db = self
            .databases
            .entry(namespace.database().to_string())
            .or_default()
            .value()
            .clone();
        let collection = db
            .collections
            .entry(namespace.collection().to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection {}", namespace);
                Arc::new(MemoryCollection::new(namespace.clone()))
            })
            .value()
            .clone();
        collection
    }

    pub(crate) fn drop_collection(&self, namespace: &Namespace) -> bool {
        match self
            .databases
            .get(namespace.database())
            .map(|db| db.value().clone())
        {
            Some(db) => db.collections.remove(namespace.collection()).is_some(),
            None => false,
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryDatabase {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

/// Documents of one collection, in insertion order.
///
/// Every request takes the collection lock once, so each request is atomic
/// with respect to other sessions.
pub(crate) struct MemoryCollection {
    namespace: Namespace,
    data: RwLock<CollectionData>,
}

#[derive(Default)]
struct CollectionData {
    documents: Vec<Document>,
    unique_fields: Vec<String>,
}

impl MemoryCollection {
    fn new(namespace: Namespace) -> Self {
        MemoryCollection {
            namespace,
            data: RwLock::new(CollectionData::default()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.read().documents.len()
    }

    pub(crate) fn add_unique_field(&self, field: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        if data.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let mut seen: Vec<&Value> = Vec::new();
        for document in data.documents.iter() {
            if let Some(value) = document.get_path(field).filter(|v| !v.is_null()) {
                if seen.contains(&value) {
                    log::error!(
                        "Cannot create unique index on {} in {}: duplicate value {}",
                        field,
                        self.namespace,
                        value
                    );
                    return Err(StoreError::new(
                        &format!(
                            "Cannot create unique index on {} in {}: duplicate value {}",
                            field, self.namespace, value
                        ),
                        ErrorKind::WriteError,
                    ));
                }
                seen.push(value);
            }
        }

        data.unique_fields.push(field.to_string());
        Ok(())
    }

    /// Inserts in order, stopping at the first rejected document.
    pub(crate) fn insert(&self, documents: Vec<Document>) -> StoreResult<Vec<DocumentId>> {
        let mut data = self.data.write();
        let mut inserted_ids = Vec::with_capacity(documents.len());
        for (index, mut document) in documents.into_iter().enumerate() {
            let outcome = document
                .ensure_id()
                .and_then(|id| data.check_unique(&self.namespace, &document, None).map(|_| id));

            match outcome {
                Ok(id) => {
                    data.documents.push(document);
                    inserted_ids.push(id);
                }
                Err(cause) => {
                    log::error!(
                        "Bulk insert into {} stopped at index {} after {} documents",
                        self.namespace,
                        index,
                        inserted_ids.len()
                    );
                    return Err(StoreError::new_with_cause(
                        &format!(
                            "Bulk insert into {} stopped at index {} after {} documents",
                            self.namespace,
                            index,
                            inserted_ids.len()
                        ),
                        ErrorKind::PartialWriteError {
                            inserted_ids,
                            failed_index: index,
                        },
                        cause,
                    ));
                }
            }
        }
        Ok(inserted_ids)
    }

    pub(crate) fn find(&self, filter: &Filter, limit: Option<usize>) -> Vec<Document> {
        let data = self.data.read();
        data.documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub(crate) fn count(&self, filter: &Filter) -> u64 {
        let data = self.data.read();
        data.documents.iter().filter(|doc| filter.matches(doc)).count() as u64
    }

    pub(crate) fn update(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
        mode: UpdateMode,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut data = self.data.write();
        let limit = match mode {
            UpdateMode::One => 1,
            UpdateMode::Many => usize::MAX,
        };
        let positions = data.positions(filter, limit);

        if positions.is_empty() {
            if !upsert {
                return Ok(UpdateOutcome::default());
            }
            let document = data.upsert(&self.namespace, filter, update)?;
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
                upserted_id: document.id(),
            });
        }

        let mut outcome = UpdateOutcome {
            matched: positions.len() as u64,
            ..UpdateOutcome::default()
        };
        for position in positions {
            if data.modify(&self.namespace, position, update)?.is_some() {
                outcome.modified += 1;
            }
        }
        Ok(outcome)
    }

    pub(crate) fn find_and_modify(
        &self,
        filter: &Filter,
        update: &UpdateSpec,
        upsert: bool,
        return_updated: bool,
    ) -> StoreResult<Option<Document>> {
        let mut data = self.data.write();
        match data.positions(filter, 1).first() {
            Some(&position) => {
                let before = data.documents[position].clone();
                data.modify(&self.namespace, position, update)?;
                if return_updated {
                    Ok(Some(data.documents[position].clone()))
                } else {
                    Ok(Some(before))
                }
            }
            None if upsert => {
                let document = data.upsert(&self.namespace, filter, update)?;
                Ok(if return_updated { Some(document) } else { None })
            }
            None => Ok(None),
        }
    }

    pub(crate) fn delete(&self, filter: &Filter, limit: Option<usize>) -> u64 {
        let mut data = self.data.write();
        let positions = data.positions(filter, limit.unwrap_or(usize::MAX));
        for position in positions.iter().rev() {
            data.documents.remove(*position);
        }
        positions.len() as u64
    }
}

impl CollectionData {
    fn positions(&self, filter: &Filter, limit: usize) -> Vec<usize> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(position, _)| position)
            .take(limit)
            .collect()
    }

    /// Applies `update` to a copy of the document at `position` and stores
    /// it if the constraints still hold. Returns the new version if it
    /// changed.
    fn modify(
        &mut self,
        namespace: &Namespace,
        position: usize,
        update: &UpdateSpec,
    ) -> StoreResult<Option<Document>> {
        let mut document = self.documents[position].clone();
        if !update.apply(&mut document)? {
            return Ok(None);
        }
        self.check_unique(namespace, &document, Some(position))?;
        self.documents[position] = document.clone();
        Ok(Some(document))
    }

    fn upsert(
        &mut self,
        namespace: &Namespace,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<Document> {
        let mut document = filter.seed()?;
        update.apply(&mut document)?;
        document.ensure_id()?;
        self.check_unique(namespace, &document, None)?;
        log::debug!("Upserted document {:?} into {}", document.id(), namespace);
        self.documents.push(document.clone());
        Ok(document)
    }

    fn check_unique(
        &self,
        namespace: &Namespace,
        document: &Document,
        skip: Option<usize>,
    ) -> StoreResult<()> {
        let keys = std::iter::once(DOC_ID).chain(self.unique_fields.iter().map(|f| f.as_str()));
        for field in keys {
            let value = match document.get_path(field) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };

            let duplicate = self
                .documents
                .iter()
                .enumerate()
                .any(|(i, other)| Some(i) != skip && other.get_path(field) == Some(value));
            if duplicate {
                log::error!("Duplicate key in {} on {}: {}", namespace, field, value);
                return Err(StoreError::new(
                    &format!("Duplicate key in {} on {}: {}", namespace, field, value),
                    ErrorKind::WriteError,
                ));
            }
        }
        Ok(())
    }
}
