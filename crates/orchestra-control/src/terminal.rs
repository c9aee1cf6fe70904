use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use orchestra_core::Diagnostic;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::process::Command;
use tracing::{info, warn};

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn resume_terminal(terminal: &mut Tui) -> Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    Ok(())
}

/// Gives the terminal to an interactive child until it exits, then takes it
/// back. The terminal is resumed whatever the child's outcome; a failure to
/// resume is returned as the outer error.
pub async fn hand_off(terminal: &mut Tui, command: Command) -> Result<Result<(), Diagnostic>> {
    restore_terminal(terminal).context("suspending terminal")?;
    info!(event = "handoff_start", program = ?command.get_program());

    let mut child = tokio::process::Command::from(command);
    let outcome = match child.status().await {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(Diagnostic::message(format!("log viewer failed: {status}"))),
        Err(err) => Err(Diagnostic::message(format!("log viewer failed: {err}"))),
    };
    if let Err(diagnostic) = &outcome {
        warn!(event = "handoff_failed", error = %diagnostic);
    }

    resume_terminal(terminal).context("resuming terminal")?;
    info!(event = "handoff_end", ok = outcome.is_ok());
    Ok(outcome)
}
