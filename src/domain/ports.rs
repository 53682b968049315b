use crate::domain::model::ScanArgs;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// The single-scan reconstruction pipeline.
///
/// Returns the path of the produced mesh when the pipeline reports one.
#[async_trait]
pub trait SingleScanRunner: Send + Sync {
    async fn run_single(&self, args: &ScanArgs) -> Result<Option<PathBuf>>;
}
