use crate::collection::DocumentId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of `insert_one`.
///
/// Serializes as `{"acknowledged":true,"insertedId":"<hex>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    acknowledged: bool,
    inserted_id: DocumentId,
}

impl InsertOneResult {
    pub(crate) fn new(inserted_id: DocumentId) -> Self {
        InsertOneResult {
            acknowledged: true,
            inserted_id,
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn inserted_id(&self) -> DocumentId {
        self.inserted_id
    }
}

/// Result of `insert_many`.
///
/// `inserted_ids` is keyed by position in the input, so it serializes as
/// `{"0":"<hex>","1":"<hex>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyResult {
    acknowledged: bool,
    inserted_count: usize,
    inserted_ids: BTreeMap<usize, DocumentId>,
}

impl InsertManyResult {
    pub(crate) fn new(ids: Vec<DocumentId>) -> Self {
        InsertManyResult {
            acknowledged: true,
            inserted_count: ids.len(),
            inserted_ids: ids.into_iter().enumerate().collect(),
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted_count
    }

    pub fn inserted_ids(&self) -> &BTreeMap<usize, DocumentId> {
        &self.inserted_ids
    }

    /// Inserted ids in input order.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.inserted_ids.values().copied().collect()
    }
}

/// Result of `update_one` and `update_many`.
///
/// When an upsert inserted a document, `matched_count` and `modified_count`
/// are zero and `upserted_id` names the new document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    acknowledged: bool,
    matched_count: u64,
    modified_count: u64,
    upserted_id: Option<DocumentId>,
    upserted_count: u64,
}

impl UpdateResult {
    pub(crate) fn new(
        matched_count: u64,
        modified_count: u64,
        upserted_id: Option<DocumentId>,
    ) -> Self {
        UpdateResult {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: if upserted_id.is_some() { 1 } else { 0 },
            upserted_id,
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }

    pub fn upserted_id(&self) -> Option<DocumentId> {
        self.upserted_id
    }

    pub fn upserted_count(&self) -> u64 {
        self.upserted_count
    }
}

/// Result of `delete_one` and `delete_many`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    acknowledged: bool,
    deleted_count: u64,
}

impl DeleteResult {
    pub(crate) fn new(deleted_count: u64) -> Self {
        DeleteResult {
            acknowledged: true,
            deleted_count,
        }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count
    }
}
