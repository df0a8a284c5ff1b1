mod adapter;
mod blueprint;
mod cli;
mod engine;
mod execution;

use adapter::builtin_adapters;
use anyhow::{Context, Result};
use cli::commands::{CheckCommand, RunCommand, WatchCommand};
use cli::output::*;
use cli::{Cli, Command};
use engine::{shutdown, CoreEngine, Shutdown, ShutdownHandle};
use execution::RunOutcome;
use std::path::PathBuf;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Watch(cmd) => watch_project(cmd).await?,
        Command::Run(cmd) => run_once(cmd).await?,
        Command::Check(cmd) => check_pipeline(cmd).await?,
    }

    Ok(())
}

fn resolve_root(root: &Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("Project root not found: {}", root.display()))
}

/// Trigger shutdown on Ctrl-C
fn spawn_interrupt_handler(handle: ShutdownHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            handle.trigger();
        }
    });
}

/// Resume paused runs on SIGUSR1 (the debug-continue control surface)
#[cfg(unix)]
fn spawn_resume_handler(pause: std::sync::Arc<execution::PauseGate>, shutdown: Shutdown) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut usr1 = match signal(SignalKind::user_defined1()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("failed to install SIGUSR1 handler: {}", e);
                return;
            }
        };
        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                received = usr1.recv() => {
                    if received.is_none() {
                        break;
                    }
                    let resumed = pause.resume_all();
                    println!("{} resumed {} paused run(s)", INFO, resumed);
                }
            }
        }
    });
}

async fn watch_project(cmd: &WatchCommand) -> Result<()> {
    let root = resolve_root(&cmd.root)?;
    let (handle, shutdown_token) = shutdown::channel();

    let engine = CoreEngine::initialize(root.clone(), builtin_adapters(), shutdown_token.clone())
        .await
        .context("Engine startup failed")?;

    println!(
        "{} Watching {} ({} pipeline) - Ctrl-C to stop",
        ROCKET,
        style(root.display()).bold(),
        style(engine.platform()).cyan()
    );

    spawn_interrupt_handler(handle);
    #[cfg(unix)]
    spawn_resume_handler(engine.pause_gate(), shutdown_token);

    engine.watch().await.context("Watcher failed")?;

    println!("{} Stopped", INFO);
    Ok(())
}

async fn run_once(cmd: &RunCommand) -> Result<()> {
    let root = resolve_root(&cmd.root)?;
    let (handle, shutdown_token) = shutdown::channel();

    let engine = CoreEngine::initialize(root, builtin_adapters(), shutdown_token)
        .await
        .context("Engine startup failed")?;

    spawn_interrupt_handler(handle);

    let report = engine.run_current().await;
    println!("{}", format_run_report(&report));

    if report.outcome == RunOutcome::Failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn check_pipeline(cmd: &CheckCommand) -> Result<()> {
    let root = resolve_root(&cmd.root)?;
    let (_handle, shutdown_token) = shutdown::channel();

    match CoreEngine::initialize(root, builtin_adapters(), shutdown_token).await {
        Ok(engine) => {
            let snapshot = engine.snapshot();
            println!("{} Pipeline definition is valid", CHECK);
            print!("{}", format_blueprint_summary(&snapshot.blueprint));

            if cmd.json {
                let json = serde_json::to_string_pretty(snapshot.blueprint.as_ref())?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Check failed:", CROSS);
            println!("  {}", style(&e).red());
            std::process::exit(1);
        }
    }
}
