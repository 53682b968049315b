use anyhow::Context;
use clap::Parser;
use mesh_batch::config::BatchSettings;
use mesh_batch::core::report::write_report;
use mesh_batch::utils::logger::{self, LogFormat};
use mesh_batch::utils::monitor::SystemMonitor;
use mesh_batch::{BatchError, BatchRunner, CliConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    let format = if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, config.verbose);

    tracing::info!("🚀 Starting mesh-batch");
    tracing::debug!("CLI config: {:?}", config);

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };

    display_settings_summary(&settings, config.dry_run);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No scans will be reconstructed");
        return perform_dry_run(&settings);
    }

    if settings.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let monitor = Arc::new(SystemMonitor::new(settings.monitor));
    let runner = settings.runner.build().with_monitor(Arc::clone(&monitor));
    let batch = BatchRunner::with_monitor(runner, monitor);

    match batch.run(settings.args.clone()).await {
        Ok(report) => {
            tracing::info!(
                "✅ Batch completed: {} scans, {} meshes",
                report.runs.len(),
                report.mesh_count()
            );
            println!("✅ Batch completed: {} scans", report.runs.len());
            for run in &report.runs {
                match &run.ply_file {
                    Some(path) => println!("  {} -> {}", run.scan, path.display()),
                    None => println!("  {} -> (no mesh reported)", run.scan),
                }
            }

            if let Some(path) = &settings.report_path {
                write_report(&report, path)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                println!("📁 Report saved to: {}", path.display());
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn fail(e: &BatchError) -> ! {
    tracing::error!(
        "❌ mesh-batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1))
}

fn display_settings_summary(settings: &BatchSettings, dry_run: bool) {
    let args = &settings.args;
    println!("📋 Configuration Summary:");
    println!("  Dataset: {}", args.dataset);
    println!("  Scans: {}", args.scans.join(", "));
    println!("  Downsample: {}", args.downsample);
    println!("  Skip COLMAP: {}", args.skip_colmap);
    println!("  Base port: {}", args.gs_port);
    println!(
        "  Runner: {} {}",
        settings.runner.program,
        settings.runner.args.join(" ")
    );

    if let Some(dir) = &settings.runner.working_directory {
        println!("  Working directory: {}", dir.display());
    }
    if !args.extra_args.is_empty() {
        println!("  Extra args: {}", args.extra_args.join(" "));
    }
    if let Some(path) = &settings.report_path {
        println!("  Report: {}", path.display());
    }
    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(settings: &BatchSettings) -> anyhow::Result<()> {
    let mut args = settings.args.clone();
    BatchRunner::<mesh_batch::ProcessRunner>::prepare(&mut args);
    let plan = BatchRunner::<mesh_batch::ProcessRunner>::plan(&args)?;
    let runner = settings.runner.build();

    println!("🔍 Execution plan:");
    for (index, (scan, port)) in plan.iter().enumerate() {
        args.colmap_name = scan.clone();
        args.gs_port = *port;
        println!(
            "  {}. {} (port {}): {} {}",
            index + 1,
            scan,
            port,
            runner.program(),
            runner.command_line(&args).join(" ")
        );
    }

    println!();
    println!("✅ Dry run complete. {} scans would be processed.", plan.len());
    Ok(())
}
