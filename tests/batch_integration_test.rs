use mesh_batch::core::report::write_report;
use mesh_batch::{
    encode_string, BatchError, BatchRunner, ProcessRunner, Result, ScanArgs, SingleScanRunner,
};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Records the argument set seen by every call.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<ScanArgs>>,
}

#[async_trait::async_trait]
impl SingleScanRunner for RecordingRunner {
    async fn run_single(&self, args: &ScanArgs) -> Result<Option<PathBuf>> {
        self.calls.lock().unwrap().push(args.clone());
        Ok(Some(PathBuf::from(format!("{}.ply", args.colmap_name))))
    }
}

#[tokio::test]
async fn test_mipnerf360_preset_batch() {
    let args = ScanArgs {
        downsample: 4,
        skip_colmap: true,
        gs_port: 6000,
        ..ScanArgs::default()
    }
    .with_preset_scans();

    let batch = BatchRunner::new(RecordingRunner::default());
    let report = batch.run(args.clone()).await.unwrap();

    let calls = batch.runner().calls.lock().unwrap();
    assert_eq!(calls.len(), args.scans.len());
    for (call, scan) in calls.iter().zip(&args.scans) {
        assert_eq!(&call.colmap_name, scan);
        assert_eq!(call.gs_port, 6000 + encode_string(scan));
        assert!(!call.skip_colmap);
        assert_eq!(call.downsample, 4);
        assert_eq!(call.scans, args.scans);
    }

    let scans: Vec<&str> = report.runs.iter().map(|r| r.scan.as_str()).collect();
    assert_eq!(
        scans,
        vec![
            "bicycle", "bonsai", "counter", "flowers", "garden", "kitchen", "room", "stump",
            "treehill"
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_batch_writes_report() {
    let temp_dir = TempDir::new().unwrap();
    let mesh_dir = temp_dir.path().join("meshes");
    std::fs::create_dir_all(&mesh_dir).unwrap();

    // 模擬單一 scan 流程：在 $3 (scan 名稱) 底下輸出網格並印出路徑
    let script = format!(
        "touch \"{dir}/$3.ply\" && echo \"mesh saved to {dir}/$3.ply\"",
        dir = mesh_dir.display()
    );
    let runner = ProcessRunner::new("sh", vec!["-c".to_string(), script]);

    let args = ScanArgs {
        scans: vec!["garden".to_string(), "room".to_string()],
        ..ScanArgs::default()
    };

    let report = BatchRunner::new(runner).run(args).await.unwrap();
    assert_eq!(report.mesh_count(), 2);
    assert_eq!(report.runs[0].ply_file, Some(mesh_dir.join("garden.ply")));
    assert!(mesh_dir.join("room.ply").exists());

    let report_path = temp_dir.path().join("report.json");
    write_report(&report, &report_path).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["runs"].as_array().unwrap().len(), 2);
    assert_eq!(written["runs"][1]["gs_port"], 8080 + encode_string("room"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_failure_stops_remaining_scans() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("calls.log");

    // 第二個 scan 失敗
    let script = format!(
        "echo \"$3\" >> \"{log}\"; [ \"$3\" != room ]",
        log = log.display()
    );
    let runner = ProcessRunner::new("sh", vec!["-c".to_string(), script]);

    let args = ScanArgs {
        scans: vec![
            "garden".to_string(),
            "room".to_string(),
            "stump".to_string(),
        ],
        ..ScanArgs::default()
    };

    let err = BatchRunner::new(runner).run(args).await.unwrap_err();
    assert!(matches!(err, BatchError::ScanFailed { ref scan, exit_code: Some(1) } if scan == "room"));

    let calls = std::fs::read_to_string(&log).unwrap();
    assert_eq!(calls.lines().collect::<Vec<_>>(), vec!["garden", "room"]);
}
