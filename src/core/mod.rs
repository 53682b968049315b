pub mod batch;
pub mod encode;
pub mod report;

pub use crate::domain::model::{BatchReport, DatasetPreset, ScanArgs, ScanRun};
pub use crate::domain::ports::SingleScanRunner;
pub use crate::utils::error::Result;
