use crate::diagnostic::Diagnostic;
use crate::layout::Layout;
use crate::store::TaskStore;
use crate::task::{Snapshot, TaskId};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;
use tracing::{debug, warn};

pub type CommandResult = Result<Snapshot, Diagnostic>;

/// One lifecycle request against the orchestrator tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    Fetch,
    Add {
        description: String,
        agent: Option<String>,
        priority: Option<String>,
    },
    Start(TaskId),
    Stop(TaskId),
    Complete(TaskId),
    Remove(TaskId),
}

impl TaskCommand {
    pub fn add(description: impl Into<String>) -> Self {
        TaskCommand::Add {
            description: description.into(),
            agent: None,
            priority: None,
        }
    }

    /// Verb understood by the orchestrator script.
    pub fn verb(&self) -> &'static str {
        match self {
            TaskCommand::Fetch => "fetch",
            TaskCommand::Add { .. } => "add",
            TaskCommand::Start(_) => "start",
            TaskCommand::Stop(_) => "stop",
            TaskCommand::Complete(_) => "complete",
            TaskCommand::Remove(_) => "remove-task",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskCommand::Fetch => "list tasks",
            TaskCommand::Add { .. } => "add task",
            TaskCommand::Start(_) => "start task",
            TaskCommand::Stop(_) => "stop task",
            TaskCommand::Complete(_) => "complete task",
            TaskCommand::Remove(_) => "remove task",
        }
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            TaskCommand::Start(id)
            | TaskCommand::Stop(id)
            | TaskCommand::Complete(id)
            | TaskCommand::Remove(id) => Some(*id),
            TaskCommand::Fetch | TaskCommand::Add { .. } => None,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, TaskCommand::Fetch)
    }

    /// Positional arguments following the verb.
    pub fn args(&self) -> Vec<String> {
        match self {
            TaskCommand::Fetch => Vec::new(),
            TaskCommand::Add {
                description,
                agent,
                priority,
            } => {
                let mut args = vec![description.clone()];
                if agent.is_some() || priority.is_some() {
                    args.push(agent.clone().unwrap_or_default());
                }
                if let Some(priority) = priority {
                    args.push(priority.clone());
                }
                args
            }
            TaskCommand::Start(id)
            | TaskCommand::Stop(id)
            | TaskCommand::Complete(id)
            | TaskCommand::Remove(id) => vec![id.to_string()],
        }
    }
}

/// Boundary to whatever actually owns task state. Every call blocks until the
/// tool is done and, on success, hands back the snapshot as it stands after the
/// call. Callers on an event loop must run these off-thread.
pub trait TaskCommandGateway: Send + Sync {
    fn fetch(&self) -> CommandResult;

    fn execute(&self, command: &TaskCommand) -> CommandResult;

    fn add(&self, description: &str) -> CommandResult {
        self.execute(&TaskCommand::add(description))
    }

    fn start(&self, id: TaskId) -> CommandResult {
        self.execute(&TaskCommand::Start(id))
    }

    fn stop(&self, id: TaskId) -> CommandResult {
        self.execute(&TaskCommand::Stop(id))
    }

    fn complete(&self, id: TaskId) -> CommandResult {
        self.execute(&TaskCommand::Complete(id))
    }

    fn remove(&self, id: TaskId) -> CommandResult {
        self.execute(&TaskCommand::Remove(id))
    }
}

/// Environment toggles the orchestrator script reads when adding tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolEnv {
    pub auto_confirm: bool,
    pub use_ai: bool,
    pub auto_launch: bool,
}

impl Default for ToolEnv {
    fn default() -> Self {
        Self {
            auto_confirm: true,
            use_ai: false,
            auto_launch: false,
        }
    }
}

impl ToolEnv {
    pub fn vars(&self) -> [(&'static str, &'static str); 3] {
        [
            ("ORCH_AUTO_CONFIRM", if self.auto_confirm { "yes" } else { "no" }),
            ("USE_AI", if self.use_ai { "true" } else { "false" }),
            (
                "ORCH_NO_AUTO_LAUNCH",
                if self.auto_launch { "false" } else { "yes" },
            ),
        ]
    }
}

pub const DEFAULT_SHELL: &str = "bash";

/// Drives the orchestrator shell script and re-reads the task document after
/// every successful mutation.
#[derive(Debug, Clone)]
pub struct ScriptGateway {
    shell: String,
    script: PathBuf,
    workdir: PathBuf,
    env: ToolEnv,
    store: TaskStore,
}

impl ScriptGateway {
    pub fn new(layout: &Layout) -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            script: layout.script.clone(),
            workdir: layout.root.clone(),
            env: ToolEnv::default(),
            store: TaskStore::new(&layout.tasks),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_env(mut self, env: ToolEnv) -> Self {
        self.env = env;
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn command(&self, verb: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.script)
            .arg(verb)
            .args(args)
            .current_dir(&self.workdir);
        cmd
    }

    /// The interactive log follower. Stdio is inherited, so the caller must
    /// give up the terminal before running it.
    pub fn log_viewer_command(&self) -> Command {
        let mut cmd = self.command("logs-tui", &["-f".to_string()]);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    fn invoke(&self, command: &TaskCommand) -> Result<(), Diagnostic> {
        let mut cmd = self.command(command.verb(), &command.args());
        cmd.stdin(Stdio::null());
        if matches!(command, TaskCommand::Add { .. }) {
            cmd.envs(self.env.vars());
        }

        let started = Instant::now();
        let output = cmd.output().map_err(|err| {
            warn!(
                event = "tool_spawn_failed",
                verb = command.verb(),
                script = %self.script.display(),
                error = %err
            );
            Diagnostic::message(format!("{} failed: {err}", command.label()))
        })?;
        debug!(
            event = "tool_exit",
            verb = command.verb(),
            status = %output.status,
            elapsed_ms = started.elapsed().as_millis() as u64
        );

        if output.status.success() {
            Ok(())
        } else {
            Err(Diagnostic::new(
                format!("{} failed: {}", command.label(), output.status),
                combined_output(&output),
            ))
        }
    }
}

impl TaskCommandGateway for ScriptGateway {
    fn fetch(&self) -> CommandResult {
        self.store.fetch().map_err(|err| {
            warn!(event = "store_read_failed", error = %err);
            Diagnostic::from(err)
        })
    }

    fn execute(&self, command: &TaskCommand) -> CommandResult {
        if command.is_mutation() {
            self.invoke(command)?;
        }
        self.fetch()
    }
}

fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }
    combined
}
