use crate::core::BatchReport;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// Writes the batch report as pretty JSON, creating parent directories.
pub fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(report)?;
    fs::write(path, data)?;
    tracing::debug!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DatasetPreset, ScanRun};
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports/nested/run.json");

        let report = BatchReport {
            dataset: DatasetPreset::MipNerf360,
            base_port: 8080,
            runs: vec![ScanRun {
                scan: "garden".to_string(),
                gs_port: 8497,
                ply_file: Some(PathBuf::from("output/garden/mesh.ply")),
                started_at: Utc::now(),
                elapsed_secs: 1.5,
            }],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        write_report(&report, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["dataset"], "mipnerf360");
        assert_eq!(written["base_port"], 8080);
        assert_eq!(written["runs"][0]["scan"], "garden");
        assert_eq!(written["runs"][0]["gs_port"], 8497);
        assert_eq!(written["runs"][0]["ply_file"], "output/garden/mesh.ply");
    }
}
