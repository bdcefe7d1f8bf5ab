use crate::collection::Document;
use std::collections::VecDeque;

/// The documents returned by `find`, in store order.
///
/// A cursor is fully materialized when the call returns, so iterating it
/// never touches the connection and cannot fail.
///
/// ```rust,ignore
/// let cursor = users.find(doc! { name: "Anna", age: 24 })?;
/// for doc in cursor {
///     println!("{}", doc);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    documents: VecDeque<Document>,
}

impl Cursor {
    pub(crate) fn new(documents: Vec<Document>) -> Self {
        Cursor {
            documents: documents.into(),
        }
    }

    /// Number of documents not yet consumed.
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Collects the remaining documents.
    pub fn to_vec(self) -> Vec<Document> {
        self.documents.into()
    }

    /// The first remaining document, without consuming it.
    pub fn first(&self) -> Option<&Document> {
        self.documents.front()
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.documents.len(), Some(self.documents.len()))
    }
}

impl ExactSizeIterator for Cursor {}

impl serde::Serialize for Cursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.documents.iter())
    }
}
