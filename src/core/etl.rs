use crate::core::{Pipeline, ResultStatus, RunSummary};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting property import...");

        // Extract
        let extracted = self.pipeline.extract().await?;
        tracing::info!("📋 Read {} rows", extracted.rows.len());

        // Transform
        let results = self.pipeline.transform(extracted).await?;
        tracing::info!("📤 Processed {} results", results.len());

        // Load
        let summary = self.pipeline.load(results).await?;
        tracing::info!(
            "📊 Success: {}, Failure: {}, Invalid Object: {}, Critical Error: {}",
            summary.count(ResultStatus::Success),
            summary.count(ResultStatus::Failure),
            summary.count(ResultStatus::InvalidObject),
            summary.count(ResultStatus::CriticalError)
        );

        Ok(summary)
    }
}
