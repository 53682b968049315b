use crate::config::toml_config::TomlConfig;
use crate::config::BatchSettings;
use crate::domain::model::DatasetPreset;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "mesh-batch")]
#[command(about = "Reconstruct a mesh for every scan of a dataset, one scan at a time")]
pub struct CliConfig {
    /// TOML configuration file; command-line values take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Dataset layout, also selects the default scan list
    #[arg(long, value_enum)]
    pub dataset: Option<DatasetPreset>,

    /// Scans to process (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub scans: Vec<String>,

    #[arg(long)]
    pub downsample: Option<u32>,

    /// Reuse existing COLMAP results (ignored when downsample > 1)
    #[arg(long)]
    pub skip_colmap: bool,

    /// Force a fresh COLMAP run even if the config file skips it
    #[arg(long, conflicts_with = "skip_colmap")]
    pub no_skip_colmap: bool,

    /// Initial COLMAP name; replaced by each scan name during the run
    #[arg(long)]
    pub colmap_name: Option<String>,

    /// Base port; each scan adds an offset derived from its name
    #[arg(long = "gs-port")]
    pub gs_port: Option<u16>,

    /// Program that reconstructs a single scan
    #[arg(long)]
    pub program: Option<String>,

    /// Argument placed before the scan flags (repeatable)
    #[arg(long = "program-arg", allow_hyphen_values = true)]
    pub program_args: Vec<String>,

    /// Working directory for the single-scan program
    #[arg(long)]
    pub working_directory: Option<String>,

    /// Write a JSON report of all runs to this file
    #[arg(long)]
    pub report: Option<String>,

    /// Show the scan/port plan without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Sample CPU and memory of each reconstruction while it runs
    #[arg(long)]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Extra arguments passed through to every single-scan run
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

impl CliConfig {
    /// 載入 TOML (若有)，套用命令列覆蓋，最後驗證
    pub fn resolve(&self) -> Result<BatchSettings> {
        let file_config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        let mut settings = self.apply_overrides(file_config);
        settings.args = settings.args.with_preset_scans();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_overrides(&self, mut file_config: TomlConfig) -> BatchSettings {
        let batch = &mut file_config.batch;

        // 換資料集時，檔案裡的 scans 不再適用 (未指定視為預設資料集)
        if let Some(dataset) = self.dataset {
            if batch.dataset.unwrap_or_default() != dataset && self.scans.is_empty() {
                batch.scans = None;
            }
            batch.dataset = Some(dataset);
        }
        if !self.scans.is_empty() {
            batch.scans = Some(self.scans.clone());
        }
        if let Some(downsample) = self.downsample {
            batch.downsample = Some(downsample);
        }
        if self.skip_colmap {
            batch.skip_colmap = Some(true);
        } else if self.no_skip_colmap {
            batch.skip_colmap = Some(false);
        }
        if let Some(name) = &self.colmap_name {
            batch.colmap_name = Some(name.clone());
        }
        if let Some(port) = self.gs_port {
            batch.gs_port = Some(port);
        }
        if !self.extra_args.is_empty() {
            batch.extra_args = Some(self.extra_args.clone());
        }

        let mut settings = file_config.into_settings();

        if let Some(program) = &self.program {
            settings.runner.program = program.clone();
            settings.runner.args = Vec::new();
        }
        if !self.program_args.is_empty() {
            settings.runner.args = self.program_args.clone();
        }
        if let Some(dir) = &self.working_directory {
            settings.runner.working_directory = Some(PathBuf::from(dir));
        }
        if let Some(report) = &self.report {
            settings.report_path = Some(PathBuf::from(report));
        }
        if self.monitor {
            settings.monitor = true;
        }

        settings
    }
}
