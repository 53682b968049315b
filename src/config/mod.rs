#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::process::{ProcessRunner, DEFAULT_PROGRAM, DEFAULT_SCRIPT};
use crate::core::encode::PORT_OFFSET_RANGE;
use crate::domain::model::ScanArgs;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_scan_names,
    Validate,
};
use std::collections::HashMap;
use std::path::PathBuf;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

/// Highest base port whose every derived port still fits in a `u16`.
pub const MAX_BASE_PORT: u16 = u16::MAX - (PORT_OFFSET_RANGE - 1);

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec![DEFAULT_SCRIPT.to_string()],
            working_directory: None,
            env: HashMap::new(),
        }
    }
}

impl RunnerSettings {
    pub fn build(&self) -> ProcessRunner {
        ProcessRunner::new(self.program.clone(), self.args.clone())
            .with_env(self.env.clone())
            .with_working_directory(self.working_directory.clone())
    }
}

/// Fully resolved configuration: CLI flags layered over the optional TOML file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchSettings {
    pub args: ScanArgs,
    pub runner: RunnerSettings,
    pub report_path: Option<PathBuf>,
    pub monitor: bool,
}

impl Validate for BatchSettings {
    fn validate(&self) -> Result<()> {
        validate_scan_names("scans", &self.args.scans)?;
        validate_positive_number("downsample", self.args.downsample, 1)?;
        validate_range("gs_port", self.args.gs_port, 1, MAX_BASE_PORT)?;
        validate_non_empty_string("runner.program", &self.runner.program)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(scans: &[&str]) -> BatchSettings {
        BatchSettings {
            args: ScanArgs {
                scans: scans.iter().map(|s| s.to_string()).collect(),
                ..ScanArgs::default()
            },
            ..BatchSettings::default()
        }
    }

    #[test]
    fn test_default_settings_with_scans_are_valid() {
        assert!(settings(&["garden"]).validate().is_ok());
    }

    #[test]
    fn test_max_base_port() {
        assert_eq!(MAX_BASE_PORT, 64536);

        let mut s = settings(&["garden"]);
        s.args.gs_port = MAX_BASE_PORT;
        assert!(s.validate().is_ok());
        s.args.gs_port = MAX_BASE_PORT + 1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_zero_downsample_rejected() {
        let mut s = settings(&["garden"]);
        s.args.downsample = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_blank_program_rejected() {
        let mut s = settings(&["garden"]);
        s.runner.program = " ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_no_scans_rejected() {
        assert!(settings(&[]).validate().is_err());
    }
}
