// Persistence boundary.
//
// The document store that keeps execution results attached to test-case
// entities is an external collaborator; the engine never sees it. This trait
// is the seam the CRUD layer implements, with an in-memory implementation so
// the API is complete on its own.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use testit_common::types::TestCaseResult;
use tokio::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn persist(&self, request_id: Uuid, results: &[TestCaseResult]) -> Result<()>;
    async fn fetch(&self, request_id: Uuid) -> Option<Vec<TestCaseResult>>;
}

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<Uuid, Vec<TestCaseResult>>>,
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn persist(&self, request_id: Uuid, results: &[TestCaseResult]) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(request_id, results.to_vec());
        Ok(())
    }

    async fn fetch(&self, request_id: Uuid) -> Option<Vec<TestCaseResult>> {
        self.records.lock().await.get(&request_id).cloned()
    }
}
