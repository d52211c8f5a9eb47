//! Edge Deployer - Entry Point
//!
//! Walks an IoT Edge device from an empty Azure subscription to a running,
//! answering model module, one step per invocation.

use std::env;
use std::process::ExitCode;

use edge_deployer::app::options::{usage, CliArgs};
use edge_deployer::app::run::run;
use edge_deployer::app::state::AppState;
use edge_deployer::logs::{init_logging, LogOptions};
use edge_deployer::storage::layout::StorageLayout;
use edge_deployer::storage::session::Session;
use edge_deployer::storage::settings::Settings;
use edge_deployer::utils::{run_diagnostic, version_info};

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli_args = CliArgs::parse(env::args().skip(1));

    // Print version and exit
    let version = version_info();
    if cli_args.flag("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", version.version),
        }
        return ExitCode::SUCCESS;
    }

    // Resolve the workspace directory
    let layout = match cli_args.get("workdir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };
    if let Err(e) = layout.setup().await {
        eprintln!("Unable to prepare workspace {:?}: {}", layout.base_dir, e);
        return ExitCode::FAILURE;
    }

    // Retrieve the settings file
    let mut settings = match layout.settings_file().read_json_or_default::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cli_args.apply_to_settings(&mut settings) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.json_logs,
        log_dir: settings.log_to_file.then(|| layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run diagnostics
    if cli_args.flag("diagnostic") || cli_args.flag("diag") {
        run_diagnostic(&settings).await;
        return ExitCode::SUCCESS;
    }

    let step = match cli_args.step() {
        Ok(Some(step)) => step,
        Ok(None) => {
            println!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, usage());
            return ExitCode::FAILURE;
        }
    };

    // Restore values from earlier steps, command line wins
    let mut session = match Session::load(&layout.session_file()).await {
        Ok(session) => session,
        Err(e) => {
            error!("Unable to read session file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cli_args.apply_to_session(&mut session) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("Edge Deployer {} ({})", version.version, version.git_hash);
    let mut state = AppState::new(layout, settings, session, cli_args);
    match run(step, &mut state, await_shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Step {} failed: {e}", step.name());
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Unable to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
