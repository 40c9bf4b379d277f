use crate::domain::model::{ExtractedRows, ObjectKind, ResultRecord, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn delimiter(&self) -> u8;
    fn endpoint(&self, kind: ObjectKind) -> String;
    fn concurrent_requests(&self) -> usize;
    fn request_timeout_seconds(&self) -> Option<u64>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedRows>;
    async fn transform(&self, data: ExtractedRows) -> Result<Vec<ResultRecord>>;
    async fn load(&self, results: Vec<ResultRecord>) -> Result<RunSummary>;
}
