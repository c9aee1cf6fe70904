mod app;
mod config;
mod event_log;
mod input;
mod keymap;
mod runtime;
mod task_list;
mod terminal;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::{App, Message};
use config::load_config;
use notify::{Config as WatchConfig, RecommendedWatcher, RecursiveMode, Watcher};
use orchestra_core::ScriptGateway;
use runtime::Runtime;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("control-center: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = load_config().context("loading configuration")?;
    init_logging(config.log_file.as_deref());
    info!(
        event = "startup",
        root = %config.layout.root.display(),
        script = %config.layout.script.display(),
        tasks = %config.layout.tasks.display(),
        shell = %config.shell,
        watch = config.watch_store
    );

    let gateway = Arc::new(
        ScriptGateway::new(&config.layout)
            .with_shell(config.shell.clone())
            .with_env(config.tool_env),
    );
    let viewer = Arc::clone(&gateway);
    let app = App::new(config.event_display, config.event_retention);
    let mut runtime = Runtime::new(
        app,
        gateway,
        Box::new(move || viewer.log_viewer_command()),
        config.tick,
    );

    let _watcher = if config.watch_store {
        setup_watcher(&config.layout.tasks, runtime.sender())
    } else {
        None
    };

    let mut terminal = terminal::setup_terminal()?;
    let result = runtime.run(&mut terminal).await;
    terminal::restore_terminal(&mut terminal)?;
    result
}

fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| eprintln!("control-center: cannot open log file {}: {err}", path.display()))
            .ok()
    });
    match file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

/// Watches the directory holding the task document and posts a refresh when
/// the document itself changes.
fn setup_watcher(tasks: &Path, tx: mpsc::Sender<Message>) -> Option<RecommendedWatcher> {
    let dir = tasks.parent()?.to_path_buf();
    let file_name = tasks.file_name()?.to_os_string();
    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            let touches_store = event
                .paths
                .iter()
                .any(|path| path.file_name() == Some(file_name.as_os_str()));
            if touches_store {
                let _ = tx.try_send(Message::StoreChanged);
            }
        },
        WatchConfig::default(),
    ) {
        Ok(watcher) => watcher,
        Err(err) => {
            warn!(event = "watcher_failed", error = %err);
            return None;
        }
    };

    if let Err(err) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!(event = "watcher_failed", dir = %dir.display(), error = %err);
        return None;
    }
    Some(watcher)
}
