use std::sync::Arc;
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
#[cfg(feature = "cli")]
use tokio::sync::oneshot;
#[cfg(feature = "cli")]
use tokio::task::JoinHandle;

#[cfg(feature = "cli")]
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Resource usage of one watched child process over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessUsage {
    pub peak_rss_mb: u64,
    pub peak_cpu_usage: f32,
    pub host_peak_mb: u64,
    pub samples: u32,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub peak_child_rss_mb: u64,
    pub elapsed_time: Duration,
}

/// 監控重建子行程與主機記憶體。
/// 子行程執行期間由背景 task 週期取樣，峰值累計在 monitor 上。
#[cfg(feature = "cli")]
#[derive(Debug)]
pub struct SystemMonitor {
    system: Mutex<System>,
    start_time: Instant,
    peak_memory: Mutex<u64>,
    peak_child_rss: Mutex<u64>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new();
        if enabled {
            system.refresh_memory();
        }

        Self {
            system: Mutex::new(system),
            start_time: Instant::now(),
            peak_memory: Mutex::new(0),
            peak_child_rss: Mutex::new(0),
            enabled,
        }
    }

    fn record_host_used(&self, used_mb: u64) {
        if let Ok(mut peak) = self.peak_memory.lock() {
            *peak = (*peak).max(used_mb);
        }
    }

    /// 取樣一次：子行程 (含直接子行程) 的 RSS 與 CPU，以及主機已用記憶體
    fn sample_process(&self, pid: Pid) -> Option<(u64, f32, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );

        let root = system.process(pid)?;
        let mut rss = root.memory();
        let mut cpu = root.cpu_usage();
        for process in system.processes().values() {
            if process.parent() == Some(pid) {
                rss += process.memory();
                cpu += process.cpu_usage();
            }
        }

        let rss_mb = rss / 1024 / 1024;
        let host_used_mb = system.used_memory() / 1024 / 1024;
        drop(system);

        self.record_host_used(host_used_mb);
        if let Ok(mut peak) = self.peak_child_rss.lock() {
            *peak = (*peak).max(rss_mb);
        }

        Some((rss_mb, cpu, host_used_mb))
    }

    /// Start sampling `pid` every [`SAMPLE_INTERVAL`] until the returned
    /// watch is finished. `None` when monitoring is disabled.
    pub fn watch_process(monitor: &Arc<SystemMonitor>, pid: u32) -> Option<ProcessWatch> {
        if !monitor.enabled {
            return None;
        }

        let monitor = Arc::clone(monitor);
        let pid = Pid::from_u32(pid);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut usage = ProcessUsage::default();
            let mut interval = tokio::time::interval(SAMPLE_INTERVAL);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let Some((rss_mb, cpu, host_mb)) = monitor.sample_process(pid) else {
                            // 行程已結束
                            continue;
                        };
                        usage.peak_rss_mb = usage.peak_rss_mb.max(rss_mb);
                        usage.peak_cpu_usage = usage.peak_cpu_usage.max(cpu);
                        usage.host_peak_mb = usage.host_peak_mb.max(host_mb);
                        usage.samples += 1;
                    }
                }
            }

            usage
        });

        Some(ProcessWatch {
            stop: Some(stop_tx),
            handle,
        })
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        if !self.enabled {
            return None;
        }

        let (total_mb, used_mb) = {
            let mut system = self.system.lock().ok()?;
            system.refresh_memory();
            (
                system.total_memory() / 1024 / 1024,
                system.used_memory() / 1024 / 1024,
            )
        };
        self.record_host_used(used_mb);

        let memory_percent = if total_mb > 0 {
            (used_mb as f32 / total_mb as f32) * 100.0
        } else {
            0.0
        };

        Some(SystemStats {
            memory_usage_mb: used_mb,
            memory_usage_percent: memory_percent,
            peak_memory_mb: self.peak_memory_mb(),
            peak_child_rss_mb: self.peak_child_rss_mb(),
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn peak_memory_mb(&self) -> u64 {
        self.peak_memory.lock().map(|p| *p).unwrap_or(0)
    }

    pub fn peak_child_rss_mb(&self) -> u64 {
        self.peak_child_rss.lock().map(|p| *p).unwrap_or(0)
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - Host memory: {}MB ({:.1}%), Host peak: {}MB, Time: {:?}",
                phase,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_usage(&self, scan: &str, usage: &ProcessUsage) {
        if self.enabled {
            tracing::info!(
                "📊 {} - Peak RSS: {}MB, Peak CPU: {:.1}%, Host peak: {}MB ({} samples)",
                scan,
                usage.peak_rss_mb,
                usage.peak_cpu_usage,
                usage.host_peak_mb,
                usage.samples
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Host peak memory: {}MB, Largest scan RSS: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb,
                stats.peak_child_rss_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Handle to a running sampler; `finish` stops it and returns the peaks.
#[cfg(feature = "cli")]
pub struct ProcessWatch {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<ProcessUsage>,
}

#[cfg(feature = "cli")]
impl ProcessWatch {
    pub async fn finish(mut self) -> ProcessUsage {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.handle).await.unwrap_or_default()
    }
}

#[cfg(feature = "cli")]
impl Drop for ProcessWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// 非 CLI 環境提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Debug, Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
pub struct ProcessWatch;

#[cfg(not(feature = "cli"))]
impl ProcessWatch {
    pub async fn finish(self) -> ProcessUsage {
        ProcessUsage::default()
    }
}

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn watch_process(_monitor: &Arc<SystemMonitor>, _pid: u32) -> Option<ProcessWatch> {
        None
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_usage(&self, _scan: &str, _usage: &ProcessUsage) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn python3_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok()
    }

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = Arc::new(SystemMonitor::new(false));
        assert!(!monitor.is_enabled());
        assert!(monitor.get_stats().is_none());
        assert!(SystemMonitor::watch_process(&monitor, std::process::id()).is_none());
    }

    #[tokio::test]
    async fn test_watch_samples_running_process() {
        let monitor = Arc::new(SystemMonitor::new(true));
        let mut child = tokio::process::Command::new("sleep")
            .arg("1")
            .spawn()
            .unwrap();

        let watch = SystemMonitor::watch_process(&monitor, child.id().unwrap()).unwrap();
        child.wait().await.unwrap();
        let usage = watch.finish().await;

        assert!(usage.samples >= 2);
        assert!(usage.host_peak_mb > 0);
        assert!(monitor.peak_memory_mb() >= usage.host_peak_mb);
    }

    #[tokio::test]
    async fn test_peak_includes_memory_held_by_child() {
        if !python3_available() {
            return;
        }

        let monitor = Arc::new(SystemMonitor::new(true));
        let before = monitor.get_stats().unwrap();

        // 寫入 300MB 並保持 1.5 秒，確保頁面真的被配置
        let mut child = tokio::process::Command::new("python3")
            .args([
                "-c",
                "import time; b = b'x' * (300 * 1024 * 1024); time.sleep(1.5)",
            ])
            .spawn()
            .unwrap();

        let watch = SystemMonitor::watch_process(&monitor, child.id().unwrap()).unwrap();
        assert!(child.wait().await.unwrap().success());
        let usage = watch.finish().await;

        assert!(usage.peak_rss_mb >= 250, "peak rss {}MB", usage.peak_rss_mb);
        assert!(monitor.peak_child_rss_mb() >= 250);
        assert!(monitor.peak_memory_mb() >= before.peak_memory_mb);
        assert!(monitor.peak_memory_mb() >= usage.host_peak_mb);
    }
}
