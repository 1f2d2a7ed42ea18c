use super::cli::{Args, Settings};
use super::pipeline::{Pipeline, PipelineError, PipelineReport};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Parse arguments, set up logging and run the pipeline to completion
pub fn startup() -> ExitCode {
    let args = Args::parse();

    // Logging is configured from these settings, so errors here go to stderr
    let settings = match Settings::resolve(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("handoff: {}", e);
            return ExitCode::from(2);
        }
    };

    let use_color = settings
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let log_file = settings
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        settings.log_level.as_deref(),
        settings.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("handoff: failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    log::info!(
        "handoff {} starting (built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        version::build_time(),
        version::git_hash()
    );
    for kind in settings.unknown_filter_kinds() {
        log::warn!("No producer publishes message kind '{}'; filter will never match", kind);
    }
    log::debug!("Resolved settings: {:#?}", settings);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: Could not start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(ShutdownCoordinator::guard_with_coordinator(
        |coordinator, shutdown_rx| run_until_shutdown(settings, coordinator, shutdown_rx),
    ));

    match result {
        Ok(report) => {
            report.log();
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error_with_context(&e, "Running handoff pipeline");
            ExitCode::FAILURE
        }
    }
}

/// Drive the pipeline on a blocking thread, stopping it early on a shutdown signal
async fn run_until_shutdown(
    settings: Settings,
    coordinator: ShutdownCoordinator,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<PipelineReport, PipelineError> {
    let pipeline = Arc::new(Pipeline::new(settings));
    let mut worker = {
        let pipeline = Arc::clone(&pipeline);
        let shutdown = coordinator.shutdown_flag();
        tokio::task::spawn_blocking(move || pipeline.run(shutdown))
    };

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = shutdown_rx.recv() => {
            log::info!("Stopping pipeline");
            pipeline.stop()?;
            worker.await
        }
    };

    coordinator.trigger_shutdown();
    joined.map_err(|_| PipelineError::ThreadPanicked {
        name: "pipeline".to_string(),
    })?
}
