use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Dataset layouts understood by the single-scan pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DatasetPreset {
    #[default]
    #[cfg_attr(feature = "cli", value(name = "mipnerf360"))]
    MipNerf360,
    Dtu,
    Tnt,
    Custom,
}

impl DatasetPreset {
    /// 沒有指定 scans 時使用的預設清單
    pub fn default_scans(&self) -> &'static [&'static str] {
        match self {
            DatasetPreset::MipNerf360 => &[
                "bicycle", "bonsai", "counter", "flowers", "garden", "kitchen", "room", "stump",
                "treehill",
            ],
            DatasetPreset::Dtu => &[
                "scan24", "scan37", "scan40", "scan55", "scan63", "scan65", "scan69", "scan83",
                "scan97", "scan105", "scan106", "scan110", "scan114", "scan118", "scan122",
            ],
            DatasetPreset::Tnt => &[
                "Barn",
                "Caterpillar",
                "Courthouse",
                "Ignatius",
                "Meetingroom",
                "Truck",
            ],
            DatasetPreset::Custom => &[],
        }
    }

    /// Name the external pipeline expects for `--dataset_name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetPreset::MipNerf360 => "MipNerf360",
            DatasetPreset::Dtu => "DTU",
            DatasetPreset::Tnt => "TNT",
            DatasetPreset::Custom => "custom",
        }
    }
}

impl fmt::Display for DatasetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument set handed to every `run_single` call.
///
/// `colmap_name` and `gs_port` are rewritten by the batch loop before each
/// call; everything else stays as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanArgs {
    pub dataset: DatasetPreset,
    pub scans: Vec<String>,
    pub downsample: u32,
    pub skip_colmap: bool,
    pub colmap_name: String,
    pub gs_port: u16,
    pub extra_args: Vec<String>,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            dataset: DatasetPreset::default(),
            scans: Vec::new(),
            downsample: 1,
            skip_colmap: false,
            colmap_name: String::new(),
            gs_port: 8080,
            extra_args: Vec::new(),
        }
    }
}

impl ScanArgs {
    /// 明確指定的 scans 優先，否則使用資料集預設清單
    pub fn with_preset_scans(mut self) -> Self {
        if self.scans.is_empty() {
            self.scans = self
                .dataset
                .default_scans()
                .iter()
                .map(|s| s.to_string())
                .collect();
        }
        self
    }

    /// Encode the argument set as command-line flags for the external pipeline.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--dataset_name".to_string(),
            self.dataset.as_str().to_string(),
            "--colmap_name".to_string(),
            self.colmap_name.clone(),
            "--GS_port".to_string(),
            self.gs_port.to_string(),
            "--downsample".to_string(),
            self.downsample.to_string(),
        ];
        if self.skip_colmap {
            args.push("--skip_colmap".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl fmt::Display for ScanArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Namespace(dataset_name={}, colmap_name={}, GS_port={}, downsample={}, skip_colmap={}, scans=[{}]",
            self.dataset,
            self.colmap_name,
            self.gs_port,
            self.downsample,
            self.skip_colmap,
            self.scans.join(", ")
        )?;
        if !self.extra_args.is_empty() {
            write!(f, ", extra=[{}]", self.extra_args.join(" "))?;
        }
        write!(f, ")")
    }
}

/// Outcome of one `run_single` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub scan: String,
    pub gs_port: u16,
    pub ply_file: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub dataset: DatasetPreset,
    pub base_port: u16,
    pub runs: Vec<ScanRun>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn mesh_count(&self) -> usize {
        self.runs.iter().filter(|r| r.ply_file.is_some()).count()
    }
}
