//! Where the orchestrator script and its task document live.
//!
//! Resolution happens once at startup against an injected [`PathProbe`], so
//! the fallback order can be exercised without touching the filesystem.

use std::path::{Path, PathBuf};

pub const SCRIPT_ENV: &str = "ORCHESTRA_SCRIPT";
pub const TASKS_ENV: &str = "ORCHESTRA_TASKS_FILE";

/// Candidates relative to the project root, checked in order. The second entry
/// covers a binary installed under `.claude/bin`.
pub const SCRIPT_CANDIDATES: [&str; 2] = [".claude/scripts/orchestrator.sh", "../scripts/orchestrator.sh"];
pub const SCRIPT_FALLBACK: &str = "../scripts/orchestrator.sh";

pub const TASKS_CANDIDATES: [&str; 2] = [".claude/tasks.json", "../../.claude/tasks.json"];
pub const TASKS_FALLBACK: &str = ".claude/tasks.json";

pub trait PathProbe {
    fn is_file(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOverrides {
    pub script: Option<PathBuf>,
    pub tasks: Option<PathBuf>,
}

impl LayoutOverrides {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path_var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };
        Self {
            script: path_var(SCRIPT_ENV),
            tasks: path_var(TASKS_ENV),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub script: PathBuf,
    pub tasks: PathBuf,
}

pub fn resolve_layout(probe: &dyn PathProbe, root: &Path, overrides: &LayoutOverrides) -> Layout {
    let script = match &overrides.script {
        Some(path) => root.join(path),
        None => first_existing(probe, root, &SCRIPT_CANDIDATES, SCRIPT_FALLBACK),
    };
    let tasks = match &overrides.tasks {
        Some(path) => root.join(path),
        None => first_existing(probe, root, &TASKS_CANDIDATES, TASKS_FALLBACK),
    };
    Layout {
        root: root.to_path_buf(),
        script,
        tasks,
    }
}

fn first_existing(probe: &dyn PathProbe, root: &Path, candidates: &[&str], fallback: &str) -> PathBuf {
    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| probe.is_file(path))
        .unwrap_or_else(|| root.join(fallback))
}
