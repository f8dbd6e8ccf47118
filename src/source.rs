use std::future::Future;

use crate::error::EngineError;
use crate::models::FactRecord;

/// Supplies the fact-table snapshot for one request.
///
/// Implementations own retries; the engine treats any error as terminal for
/// the whole batch.
pub trait FactSource {
    fn fetch_fact_records(
        &self,
    ) -> impl Future<Output = Result<Vec<FactRecord>, EngineError>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFactSource {
    records: Vec<FactRecord>,
}

impl MemoryFactSource {
    pub fn new(records: Vec<FactRecord>) -> Self {
        Self { records }
    }
}

impl FactSource for MemoryFactSource {
    async fn fetch_fact_records(&self) -> Result<Vec<FactRecord>, EngineError> {
        Ok(self.records.clone())
    }
}
