/// Options for `update_one` and `update_many`.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::collection::{upsert, UpdateOptions};
///
/// // Update existing documents only
/// let options = UpdateOptions::default();
///
/// // Insert a document built from the filter if nothing matches
/// let options = upsert();
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    upsert: bool,
}

impl UpdateOptions {
    /// Creates a new `UpdateOptions`.
    ///
    /// # Arguments
    ///
    /// * `upsert` - If true, insert a new document when no document matches
    pub fn new(upsert: bool) -> Self {
        Self { upsert }
    }

    /// Returns `UpdateOptions` with upsert enabled.
    pub fn upsert() -> Self {
        Self::new(true)
    }

    /// Returns whether to insert when no matching document is found.
    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Creates `UpdateOptions` with upsert behavior.
///
/// If no document matches the filter, a new document is synthesized from the
/// filter's equality fields and the update is applied to it.
pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(true)
}

/// Options for `find_one_and_update`.
///
/// By default the document is returned as it was before the update, and no
/// document is inserted when nothing matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOneAndUpdateOptions {
    return_updated: bool,
    upsert: bool,
}

impl FindOneAndUpdateOptions {
    pub fn new(return_updated: bool, upsert: bool) -> Self {
        Self {
            return_updated,
            upsert,
        }
    }

    /// Returns the post-update snapshot instead of the pre-update one.
    pub fn return_updated(mut self, return_updated: bool) -> Self {
        self.return_updated = return_updated;
        self
    }

    /// Inserts a synthesized document when nothing matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn is_return_updated(&self) -> bool {
        self.return_updated
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Creates `FindOneAndUpdateOptions` returning the updated document.
pub fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::new(true, false)
}
