//! End-to-end lifecycle scenarios driven through a [`TaskCommandGateway`].
//!
//! Both scenarios re-read the task document after every step and compare it
//! against what the step should have done, so they work the same against the
//! real orchestrator script and against an in-process fake.

use orchestra_core::{Diagnostic, Snapshot, Task, TaskCommand, TaskCommandGateway, TaskId, TaskStatus};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const LIFECYCLE_DESCRIPTION: &str = "Integration Test Task";
pub const FULL_DESCRIPTION: &str = "Process Verification Task";

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{step} step failed")]
    Command {
        step: &'static str,
        #[source]
        source: Diagnostic,
    },
    #[error("task {description:?} not found after adding")]
    NotAdded { description: String },
    #[error("task #{id} lost after {step}")]
    Lost { id: TaskId, step: &'static str },
    #[error("expected task #{id} to be '{expected}' after {step}, got '{actual}'")]
    UnexpectedStatus {
        id: TaskId,
        step: &'static str,
        expected: TaskStatus,
        actual: TaskStatus,
    },
    #[error("task #{id} changed from '{before}' to '{after}' during {step} of task #{target}")]
    Collateral {
        id: TaskId,
        target: TaskId,
        step: &'static str,
        before: TaskStatus,
        after: TaskStatus,
    },
    #[error("task #{id} still exists after removal")]
    NotRemoved { id: TaskId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Step(String),
    Warning(String),
}

#[derive(Debug, Clone)]
pub struct FullOptions {
    pub description: String,
    pub agent: String,
    pub priority: String,
    /// Directory where the orchestrator drops `<agent>.pid` for launched agents.
    pub pid_dir: PathBuf,
    /// Pause after start and stop so launched processes can settle.
    pub settle: Duration,
}

/// add → start → complete, checking each transition and that no other task
/// moved along the way. Returns the id of the task it created.
pub fn run_lifecycle<G>(
    gateway: &G,
    description: &str,
    mut report: impl FnMut(Progress),
) -> Result<TaskId, ScenarioError>
where
    G: TaskCommandGateway + ?Sized,
{
    // The document may not exist yet on a fresh project.
    let baseline = gateway.fetch().unwrap_or_default();

    report(Progress::Step(format!("Adding Task: '{description}'")));
    perform(gateway, "add", &TaskCommand::add(description))?;
    let after_add = fetch(gateway, "fetch")?;
    let task = find_added(&baseline, &after_add, description)?;
    let id = task.id;
    report(Progress::Step(format!("Task Added. ID: {id}")));

    report(Progress::Step(format!("Starting Task #{id}")));
    perform(gateway, "start", &TaskCommand::Start(id))?;
    let after_start = fetch(gateway, "fetch")?;
    expect_status(&after_start, id, "start", TaskStatus::InProgress)?;
    check_collateral(&after_add, &after_start, id, "start")?;
    report(Progress::Step(
        "Task Started successfully (Status: in_progress)".to_string(),
    ));

    report(Progress::Step(format!("Completing Task #{id}")));
    perform(gateway, "complete", &TaskCommand::Complete(id))?;
    let after_complete = fetch(gateway, "fetch")?;
    expect_status(&after_complete, id, "complete", TaskStatus::Completed)?;
    check_collateral(&after_start, &after_complete, id, "complete")?;
    report(Progress::Step(
        "Task Completed successfully (Status: completed)".to_string(),
    ));

    Ok(id)
}

/// add (with agent and priority) → start → stop → remove, additionally
/// watching the agent's pid file. A missing or lingering pid file is reported
/// as a warning, not a failure.
pub fn run_full<G>(
    gateway: &G,
    options: &FullOptions,
    mut report: impl FnMut(Progress),
) -> Result<TaskId, ScenarioError>
where
    G: TaskCommandGateway + ?Sized,
{
    let baseline = gateway.fetch().unwrap_or_default();

    report(Progress::Step(format!(
        "[Add] Adding Task for '{}' agent...",
        options.agent
    )));
    let add = TaskCommand::Add {
        description: options.description.clone(),
        agent: Some(options.agent.clone()),
        priority: Some(options.priority.clone()),
    };
    perform(gateway, "add", &add)?;

    report(Progress::Step("[View] Verifying Task Added...".to_string()));
    let after_add = fetch(gateway, "fetch")?;
    let task = find_added(&baseline, &after_add, &options.description)?;
    let id = task.id;
    report(Progress::Step(format!(
        "Task Added. ID: {id} Agent: {}",
        task.agent
    )));

    report(Progress::Step(format!("[Start] Starting Task #{id}...")));
    perform(gateway, "start", &TaskCommand::Start(id))?;
    settle(options.settle);
    let after_start = fetch(gateway, "fetch")?;
    expect_status(&after_start, id, "start", TaskStatus::InProgress)?;
    report(Progress::Step("Task Started (Status: in_progress)".to_string()));

    let pid_file = options.pid_dir.join(format!("{}.pid", options.agent));
    if pid_file.is_file() {
        report(Progress::Step(format!(
            "Verified PID file exists: {}",
            pid_file.display()
        )));
    } else {
        report(Progress::Warning(format!(
            "PID file not found at {}. Process did not start?",
            pid_file.display()
        )));
    }

    report(Progress::Step(format!("[Stop] Stopping Task #{id}...")));
    perform(gateway, "stop", &TaskCommand::Stop(id))?;
    settle(options.settle / 2);
    let after_stop = fetch(gateway, "fetch")?;
    match after_stop.find(id) {
        Some(task) => report(Progress::Step(format!(
            "Task Status after Stop: {}",
            task.status
        ))),
        None => return Err(ScenarioError::Lost { id, step: "stop" }),
    }
    if pid_file.exists() {
        report(Progress::Warning(format!(
            "PID file still exists: {}",
            pid_file.display()
        )));
    } else {
        report(Progress::Step(
            "Verified PID file removed (Process stopped)".to_string(),
        ));
    }

    report(Progress::Step(format!("[Delete] Removing Task #{id}...")));
    perform(gateway, "remove", &TaskCommand::Remove(id))?;
    let after_remove = fetch(gateway, "fetch")?;
    if after_remove.find(id).is_some() {
        return Err(ScenarioError::NotRemoved { id });
    }
    report(Progress::Step("Task Removed successfully".to_string()));

    Ok(id)
}

fn perform<G>(gateway: &G, step: &'static str, command: &TaskCommand) -> Result<(), ScenarioError>
where
    G: TaskCommandGateway + ?Sized,
{
    debug!(event = "scenario_step", step, verb = command.verb());
    gateway
        .execute(command)
        .map(|_| ())
        .map_err(|source| ScenarioError::Command { step, source })
}

fn fetch<G>(gateway: &G, step: &'static str) -> Result<Snapshot, ScenarioError>
where
    G: TaskCommandGateway + ?Sized,
{
    gateway
        .fetch()
        .map_err(|source| ScenarioError::Command { step, source })
}

/// The pending task matching `description` (case-insensitively), preferring
/// one that was not there before the add.
fn find_added(baseline: &Snapshot, current: &Snapshot, description: &str) -> Result<Task, ScenarioError> {
    let wanted = description.to_lowercase();
    let existing: HashSet<TaskId> = baseline.tasks.iter().map(|task| task.id).collect();
    let mut candidates = current
        .pending()
        .filter(|task| task.description.to_lowercase() == wanted);
    let first = candidates.next();
    first
        .into_iter()
        .chain(candidates)
        .find(|task| !existing.contains(&task.id))
        .or(first)
        .cloned()
        .ok_or_else(|| ScenarioError::NotAdded {
            description: description.to_string(),
        })
}

fn expect_status(
    snapshot: &Snapshot,
    id: TaskId,
    step: &'static str,
    expected: TaskStatus,
) -> Result<(), ScenarioError> {
    let task = snapshot.find(id).ok_or(ScenarioError::Lost { id, step })?;
    if task.status != expected {
        return Err(ScenarioError::UnexpectedStatus {
            id,
            step,
            expected,
            actual: task.status,
        });
    }
    Ok(())
}

fn check_collateral(
    before: &Snapshot,
    after: &Snapshot,
    target: TaskId,
    step: &'static str,
) -> Result<(), ScenarioError> {
    for task in before.tasks.iter().filter(|task| task.id != target) {
        if let Some(now) = after.find(task.id) {
            if now.status != task.status {
                return Err(ScenarioError::Collateral {
                    id: task.id,
                    target,
                    step,
                    before: task.status,
                    after: now.status,
                });
            }
        }
    }
    Ok(())
}

fn settle(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
