use crate::config::{BatchSettings, RunnerSettings};
use crate::domain::model::{DatasetPreset, ScanArgs};
use crate::utils::error::{BatchError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub batch: BatchSection,
    pub runner: Option<RunnerSection>,
    pub report: Option<ReportSection>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSection {
    pub dataset: Option<DatasetPreset>,
    pub scans: Option<Vec<String>>,
    pub downsample: Option<u32>,
    pub skip_colmap: Option<bool>,
    pub colmap_name: Option<String>,
    pub gs_port: Option<u16>,
    pub extra_args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSection {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub working_directory: Option<String>,
    pub env: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BatchError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 轉成完整設定，未指定的欄位使用預設值
    pub fn into_settings(self) -> BatchSettings {
        let defaults = ScanArgs::default();
        let batch = self.batch;

        let args = ScanArgs {
            dataset: batch.dataset.unwrap_or(defaults.dataset),
            scans: batch.scans.unwrap_or_default(),
            downsample: batch.downsample.unwrap_or(defaults.downsample),
            skip_colmap: batch.skip_colmap.unwrap_or(defaults.skip_colmap),
            colmap_name: batch.colmap_name.unwrap_or_default(),
            gs_port: batch.gs_port.unwrap_or(defaults.gs_port),
            extra_args: batch.extra_args.unwrap_or_default(),
        }
        .with_preset_scans();

        let mut runner = RunnerSettings::default();
        if let Some(section) = self.runner {
            if let Some(program) = section.program {
                runner.program = program;
                // 換了程式就不再套用預設腳本
                runner.args = Vec::new();
            }
            if let Some(args) = section.args {
                runner.args = args;
            }
            runner.working_directory = section.working_directory.map(PathBuf::from);
            runner.env = section.env.unwrap_or_default();
        }

        BatchSettings {
            args,
            runner,
            report_path: self.report.map(|r| PathBuf::from(r.path)),
            monitor: self.monitoring.map(|m| m.enabled).unwrap_or(false),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.clone().into_settings().validate()
    }
}
