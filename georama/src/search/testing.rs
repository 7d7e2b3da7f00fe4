//! Test double for the search index.

use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{IndexError, SearchIndex};
use super::document::SearchDocument;

/// In-memory index recording every upsert and delete.
#[derive(Debug, Default)]
pub struct RecordingIndex {
    documents: Mutex<HashMap<String, SearchDocument>>,
    fail_next: Mutex<bool>,
}

impl RecordingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document currently stored under `public_id`, if any.
    pub fn get(&self, public_id: &str) -> Option<SearchDocument> {
        self.documents.lock().expect("lock").get(public_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().expect("lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes the next operation fail with a status error.
    pub fn fail_next(&self) {
        *self.fail_next.lock().expect("lock") = true;
    }

    fn take_failure(&self, operation: &'static str, id: &str) -> Result<(), IndexError> {
        let mut fail = self.fail_next.lock().expect("lock");
        if *fail {
            *fail = false;
            return Err(IndexError::Status {
                status: 503,
                operation,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

impl SearchIndex for RecordingIndex {
    async fn upsert(&self, public_id: &str, document: &SearchDocument) -> Result<(), IndexError> {
        self.take_failure("upsert", public_id)?;
        self.documents
            .lock()
            .expect("lock")
            .insert(public_id.to_string(), document.clone());
        Ok(())
    }

    async fn delete(&self, public_id: &str) -> Result<(), IndexError> {
        self.take_failure("delete", public_id)?;
        self.documents.lock().expect("lock").remove(public_id);
        Ok(())
    }
}
