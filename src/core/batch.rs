use crate::core::encode::scan_port;
use crate::core::{BatchReport, ScanArgs, ScanRun, SingleScanRunner};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Drives one `run_single` call per scan, strictly in order.
pub struct BatchRunner<R: SingleScanRunner> {
    runner: R,
    monitor: Arc<SystemMonitor>,
}

/// Echo the scan name and the full argument set before each run.
pub fn announce_scan<W: Write>(out: &mut W, args: &ScanArgs) -> std::io::Result<()> {
    writeln!(out, "{}", args.colmap_name)?;
    writeln!(out, "{}", args)?;
    out.flush()
}

impl<R: SingleScanRunner> BatchRunner<R> {
    pub fn new(runner: R) -> Self {
        Self::with_monitor(runner, Arc::new(SystemMonitor::new(false)))
    }

    /// The monitor is usually shared with the runner, which samples the child.
    pub fn with_monitor(runner: R, monitor: Arc<SystemMonitor>) -> Self {
        Self { runner, monitor }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Apply the pre-loop rules: a downsampled run must rebuild COLMAP.
    pub fn prepare(args: &mut ScanArgs) {
        if args.downsample > 1 && args.skip_colmap {
            tracing::info!(
                "downsample={} requires a fresh COLMAP run, ignoring skip_colmap",
                args.downsample
            );
        }
        if args.downsample > 1 {
            args.skip_colmap = false;
        }
    }

    /// The (scan, port) pairs `run` would use, without invoking anything.
    pub fn plan(args: &ScanArgs) -> Result<Vec<(String, u16)>> {
        args.scans
            .iter()
            .map(|scan| Ok((scan.clone(), scan_port(args.gs_port, scan)?)))
            .collect()
    }

    pub async fn run(&self, mut args: ScanArgs) -> Result<BatchReport> {
        Self::prepare(&mut args);

        let base_port = args.gs_port;
        let started_at = Utc::now();
        let scans = args.scans.clone();
        let mut runs = Vec::with_capacity(scans.len());

        tracing::info!(
            "Starting batch of {} scans (dataset: {}, base port: {})",
            scans.len(),
            args.dataset,
            base_port
        );
        self.monitor.log_stats("Batch start");

        for (index, scan_name) in scans.iter().enumerate() {
            args.colmap_name = scan_name.clone();
            args.gs_port = scan_port(base_port, scan_name)?;

            announce_scan(&mut std::io::stdout().lock(), &args)?;

            let span = tracing::info_span!(
                "scan",
                dataset = %args.dataset,
                scan = %scan_name,
                gs_port = args.gs_port
            );
            span.in_scope(|| {
                tracing::info!(
                    "[{}/{}] Reconstructing '{}' on port {}",
                    index + 1,
                    scans.len(),
                    scan_name,
                    args.gs_port
                )
            });

            let scan_started_at = Utc::now();
            let now = Instant::now();
            let ply_file = self
                .runner
                .run_single(&args)
                .instrument(span.clone())
                .await?;
            let elapsed = now.elapsed();

            span.in_scope(|| match &ply_file {
                Some(path) => tracing::info!(
                    "✅ '{}' done in {:.1}s, mesh: {}",
                    scan_name,
                    elapsed.as_secs_f64(),
                    path.display()
                ),
                None => tracing::warn!(
                    "'{}' finished in {:.1}s but reported no mesh file",
                    scan_name,
                    elapsed.as_secs_f64()
                ),
            });

            runs.push(ScanRun {
                scan: scan_name.clone(),
                gs_port: args.gs_port,
                ply_file,
                started_at: scan_started_at,
                elapsed_secs: elapsed.as_secs_f64(),
            });
        }

        self.monitor.log_final_stats();

        Ok(BatchReport {
            dataset: args.dataset,
            base_port,
            runs,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
