//! Message loop for the dashboard.
//!
//! The loop is the only place the [`App`] is touched. Terminal input, ticks and
//! finished gateway calls all arrive here and are applied one at a time;
//! gateway calls themselves run on the blocking pool and report back through
//! the message queue.

use crate::app::{App, Effect, Message};
use crate::terminal::{self, Tui};
use crate::ui;
use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures_util::StreamExt;
use orchestra_core::{Diagnostic, TaskCommand, TaskCommandGateway};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub const MESSAGE_QUEUE_CAPACITY: usize = 64;

pub type LogViewerFactory = Box<dyn Fn() -> Command + Send>;

/// Runs gateway calls off the event loop and posts each result back as a
/// [`Message::CommandFinished`]. Results are delivered in completion order.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn TaskCommandGateway>,
    tx: mpsc::Sender<Message>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn TaskCommandGateway>, tx: mpsc::Sender<Message>) -> Self {
        Self { gateway, tx }
    }

    pub fn dispatch(&self, command: TaskCommand) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let job = command.clone();
            let result = match tokio::task::spawn_blocking(move || gateway.execute(&job)).await {
                Ok(result) => result,
                Err(err) => Err(Diagnostic::message(format!(
                    "{} failed: {err}",
                    command.label()
                ))),
            };
            info!(
                event = "command_finished",
                verb = command.verb(),
                task_id = command.task_id(),
                ok = result.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64
            );
            if tx
                .send(Message::CommandFinished { command, result })
                .await
                .is_err()
            {
                warn!(event = "result_dropped", reason = "message queue closed");
            }
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    OpenLogViewer,
    Quit,
}

pub struct Runtime {
    app: App,
    dispatcher: Dispatcher,
    tx: mpsc::Sender<Message>,
    rx: mpsc::Receiver<Message>,
    log_viewer: LogViewerFactory,
    tick: Duration,
}

impl Runtime {
    pub fn new(
        app: App,
        gateway: Arc<dyn TaskCommandGateway>,
        log_viewer: LogViewerFactory,
        tick: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_QUEUE_CAPACITY);
        Self {
            app,
            dispatcher: Dispatcher::new(gateway, tx.clone()),
            tx,
            rx,
            log_viewer,
            tick,
        }
    }

    /// Handle for producers outside the loop, such as the store watcher.
    pub fn sender(&self) -> mpsc::Sender<Message> {
        self.tx.clone()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let effects = self.app.init();
        self.apply(effects);

        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            terminal.draw(|frame| ui::render(frame, &mut self.app))?;

            let message = tokio::select! {
                _ = ticker.tick() => Message::Tick,
                Some(message) = self.rx.recv() => message,
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => match translate(event) {
                        Some(message) => message,
                        None => continue,
                    },
                    Some(Err(err)) => {
                        warn!(event = "terminal_read_failed", error = %err);
                        continue;
                    }
                    None => break,
                },
            };

            match self.step(message) {
                Control::Continue => {}
                Control::Quit => break,
                Control::OpenLogViewer => {
                    drop(events);
                    let outcome = terminal::hand_off(terminal, (self.log_viewer)()).await?;
                    events = EventStream::new();
                    if self.step(Message::LogViewerExited(outcome)) == Control::Quit {
                        break;
                    }
                }
            }
        }

        info!(event = "shutdown", in_flight = self.app.in_flight());
        Ok(())
    }

    fn step(&mut self, message: Message) -> Control {
        let effects = self.app.update(message);
        self.apply(effects)
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Control {
        let mut control = Control::Continue;
        for effect in effects {
            match effect {
                Effect::Dispatch(command) => self.dispatcher.dispatch(command),
                Effect::OpenLogViewer => control = Control::OpenLogViewer,
                Effect::Quit => return Control::Quit,
            }
        }
        control
    }
}

fn translate(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
            Some(Message::Key(key))
        }
        Event::Resize(width, height) => Some(Message::Resize(width, height)),
        _ => None,
    }
}
