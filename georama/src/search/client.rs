//! Search index client.
//!
//! The pipeline is the single writer of the index. Documents are keyed by
//! public id, so re-publication is idempotent. The trait seam lets tests
//! record documents in memory instead of talking to a server.

use std::future::Future;
use thiserror::Error;
use tracing::debug;

use super::document::SearchDocument;
use crate::config::IndexSettings;

/// Failure talking to the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Transport-level failure
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The index answered with an unexpected status
    #[error("index returned status {status} for {operation} of '{id}'")]
    Status {
        status: u16,
        operation: &'static str,
        id: String,
    },
}

/// Document-level operations against the search index.
pub trait SearchIndex: Send + Sync {
    /// Inserts or replaces the document stored under `public_id`.
    fn upsert(
        &self,
        public_id: &str,
        document: &SearchDocument,
    ) -> impl Future<Output = Result<(), IndexError>> + Send;

    /// Removes the document stored under `public_id`. Removing an absent
    /// document is not an error.
    fn delete(&self, public_id: &str) -> impl Future<Output = Result<(), IndexError>> + Send;
}

/// Shared handles behave like the index they wrap. Lets a test hand the
/// dispatcher one handle and keep another for assertions.
impl<S: SearchIndex> SearchIndex for std::sync::Arc<S> {
    async fn upsert(&self, public_id: &str, document: &SearchDocument) -> Result<(), IndexError> {
        S::upsert(self, public_id, document).await
    }

    async fn delete(&self, public_id: &str) -> Result<(), IndexError> {
        S::delete(self, public_id).await
    }
}

/// Elasticsearch-compatible HTTP implementation.
#[derive(Debug, Clone)]
pub struct EsIndex {
    client: reqwest::Client,
    base_url: String,
    index_name: String,
    username: Option<String>,
    password: Option<String>,
}

impl EsIndex {
    pub fn new(settings: &IndexSettings) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: settings.base_url(),
            index_name: settings.index_name.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn document_url(&self, public_id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index_name, public_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_deref()),
            None => request,
        }
    }

    /// Cheap connectivity check, used at startup to fail fast.
    pub async fn ping(&self) -> Result<(), IndexError> {
        let response = self
            .authorized(self.client.get(&self.base_url))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(IndexError::Status {
                status: response.status().as_u16(),
                operation: "ping",
                id: String::new(),
            })
        }
    }
}

impl SearchIndex for EsIndex {
    async fn upsert(&self, public_id: &str, document: &SearchDocument) -> Result<(), IndexError> {
        let response = self
            .authorized(self.client.put(self.document_url(public_id)))
            .json(document)
            .send()
            .await?;
        if response.status().is_success() {
            debug!(public_id, "indexed document");
            Ok(())
        } else {
            Err(IndexError::Status {
                status: response.status().as_u16(),
                operation: "upsert",
                id: public_id.to_string(),
            })
        }
    }

    async fn delete(&self, public_id: &str) -> Result<(), IndexError> {
        let response = self
            .authorized(self.client.delete(self.document_url(public_id)))
            .send()
            .await?;
        // 404 means the projection is already gone, which is the goal state.
        if response.status().is_success() || response.status().as_u16() == 404 {
            debug!(public_id, "removed document");
            Ok(())
        } else {
            Err(IndexError::Status {
                status: response.status().as_u16(),
                operation: "delete",
                id: public_id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_document_url() {
        let mut settings = Settings::default().index;
        settings.host = "search.example.org".to_string();
        settings.port = 9200;
        settings.index_name = "vk_test".to_string();
        let index = EsIndex::new(&settings).expect("client");
        assert_eq!(
            index.document_url("oai:de:slub-dresden:vk:id-42"),
            "http://search.example.org:9200/vk_test/_doc/oai:de:slub-dresden:vk:id-42"
        );
    }
}
