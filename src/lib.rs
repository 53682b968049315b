pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::process::ProcessRunner;
pub use crate::config::{BatchSettings, RunnerSettings};
pub use crate::core::{batch::BatchRunner, encode::encode_string};
pub use crate::domain::model::{BatchReport, DatasetPreset, ScanArgs, ScanRun};
pub use crate::domain::ports::SingleScanRunner;
pub use crate::utils::error::{BatchError, Result};
