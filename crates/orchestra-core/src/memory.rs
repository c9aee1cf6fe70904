//! In-process stand-in for the orchestrator tool, used by tests.

use crate::command::{CommandResult, TaskCommand, TaskCommandGateway};
use crate::diagnostic::Diagnostic;
use crate::task::{Snapshot, Task, TaskId, TaskStatus};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_AGENT: &str = "general";

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    next_id: TaskId,
    calls: Vec<TaskCommand>,
    fail_next: Option<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(MemoryState {
                tasks,
                next_id,
                calls: Vec::new(),
                fail_next: None,
            }),
        }
    }

    /// The next call of any kind fails with this diagnostic and changes nothing.
    pub fn fail_next(&self, diagnostic: Diagnostic) {
        self.lock().fail_next = Some(diagnostic);
    }

    pub fn calls(&self) -> Vec<TaskCommand> {
        self.lock().calls.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.lock().tasks.clone())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn task_mut(&mut self, command: &TaskCommand, id: TaskId) -> Result<&mut Task, Diagnostic> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| {
                Diagnostic::new(
                    format!("{} failed: exit status: 1", command.label()),
                    format!("Task #{id} not found"),
                )
            })
    }

    fn apply(&mut self, command: &TaskCommand) -> Result<(), Diagnostic> {
        match command {
            TaskCommand::Fetch => {}
            TaskCommand::Add {
                description,
                agent,
                priority,
            } => {
                let id = self.next_id;
                self.next_id += 1;
                let task = Task::new(id, description.clone(), TaskStatus::Pending)
                    .with_agent(agent.clone().unwrap_or_default())
                    .with_priority(priority.clone().unwrap_or_else(|| "medium".to_string()));
                self.tasks.push(task);
            }
            TaskCommand::Start(id) => {
                let task = self.task_mut(command, *id)?;
                task.status = TaskStatus::InProgress;
                if task.agent.is_empty() {
                    task.agent = DEFAULT_AGENT.to_string();
                }
            }
            TaskCommand::Stop(id) => {
                self.task_mut(command, *id)?.status = TaskStatus::Pending;
            }
            TaskCommand::Complete(id) => {
                self.task_mut(command, *id)?.status = TaskStatus::Completed;
            }
            TaskCommand::Remove(id) => {
                self.task_mut(command, *id)?;
                self.tasks.retain(|task| task.id != *id);
            }
        }
        Ok(())
    }
}

impl TaskCommandGateway for MemoryGateway {
    fn fetch(&self) -> CommandResult {
        self.execute(&TaskCommand::Fetch)
    }

    fn execute(&self, command: &TaskCommand) -> CommandResult {
        let mut state = self.lock();
        state.calls.push(command.clone());
        if let Some(diagnostic) = state.fail_next.take() {
            return Err(diagnostic);
        }
        state.apply(command)?;
        Ok(Snapshot::new(state.tasks.clone()))
    }
}
