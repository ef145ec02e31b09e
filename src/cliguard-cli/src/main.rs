//! Cliguard - MCP stdio server binary.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cliguard_exec::CommandExecutor;
use cliguard_execpolicy::PolicySettings;
use tokio::signal;
use tracing::{error, info};

use cliguard_cli::logging::setup_logging;
use cliguard_cli::{Args, build_server};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_level, args.json_logs);

    let policy = match args.policy_settings().and_then(PolicySettings::into_config) {
        Ok(policy) => policy,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        root = %policy.root_dir().display(),
        timeout_secs = policy.command_timeout().as_secs(),
        shell_operators = policy.allow_shell_operators(),
        mode = %args.mode,
        "Policy loaded"
    );

    let executor = Arc::new(CommandExecutor::new(Arc::new(policy)).with_default_mode(args.mode));

    let server = match build_server(executor) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let serving = Arc::clone(&server).run_stdio();
    tokio::pin!(serving);

    let finished = tokio::select! {
        result = &mut serving => Some(result),
        _ = signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            info!("Received Ctrl+C, finishing in-flight requests");
            server.stop().await;
            serving.await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
