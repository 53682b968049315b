//! Runs the single-scan pipeline as a child process.
//!
//! Each call spawns `program base_args.. <encoded scan args>`, echoes the
//! child's stdout line by line, and takes the last stdout line that names a
//! `.ply` file as the produced mesh.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::domain::model::ScanArgs;
use crate::domain::ports::SingleScanRunner;
use crate::utils::error::{BatchError, Result};
use crate::utils::monitor::SystemMonitor;

pub const DEFAULT_PROGRAM: &str = "python";
pub const DEFAULT_SCRIPT: &str = "run_single.py";

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    base_args: Vec<String>,
    env_vars: HashMap<String, String>,
    working_directory: Option<PathBuf>,
    monitor: Option<Arc<SystemMonitor>>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, vec![DEFAULT_SCRIPT.to_string()])
    }
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            env_vars: HashMap::new(),
            working_directory: None,
            monitor: None,
        }
    }

    pub fn with_env(mut self, env_vars: HashMap<String, String>) -> Self {
        self.env_vars = env_vars;
        self
    }

    pub fn with_working_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.working_directory = dir;
        self
    }

    /// Sample the child's memory and CPU while it runs.
    pub fn with_monitor(mut self, monitor: Arc<SystemMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument vector for one scan.
    pub fn command_line(&self, args: &ScanArgs) -> Vec<String> {
        let mut line = self.base_args.clone();
        line.extend(args.to_cli_args());
        line
    }

    fn build_command(&self, args: &ScanArgs) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.command_line(args))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// 輸出中以 `.ply` 結尾的行視為網格路徑，取最後一個
fn mesh_path_from_line(line: &str) -> Option<PathBuf> {
    let trimmed = line.trim();
    let candidate = trimmed.rsplit(char::is_whitespace).next()?;
    if Path::new(candidate)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"))
    {
        Some(PathBuf::from(candidate))
    } else {
        None
    }
}

#[async_trait]
impl SingleScanRunner for ProcessRunner {
    async fn run_single(&self, args: &ScanArgs) -> Result<Option<PathBuf>> {
        tracing::debug!(
            "Spawning {} {}",
            self.program,
            self.command_line(args).join(" ")
        );

        let mut child = self
            .build_command(args)
            .spawn()
            .map_err(|source| BatchError::SpawnError {
                program: self.program.clone(),
                source,
            })?;

        let watch = match (&self.monitor, child.id()) {
            (Some(monitor), Some(pid)) => SystemMonitor::watch_process(monitor, pid),
            _ => None,
        };

        let mut ply_file = None;
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                println!("{}", line);
                if let Some(path) = mesh_path_from_line(&line) {
                    ply_file = Some(path);
                }
            }
        }

        let status = child.wait().await?;
        if let (Some(watch), Some(monitor)) = (watch, &self.monitor) {
            let usage = watch.finish().await;
            monitor.log_usage(&args.colmap_name, &usage);
        }

        if !status.success() {
            return Err(BatchError::ScanFailed {
                scan: args.colmap_name.clone(),
                exit_code: status.code(),
            });
        }

        // 相對路徑以子行程的工作目錄為準
        Ok(ply_file.map(|path| match &self.working_directory {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }))
    }
}
