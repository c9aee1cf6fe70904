use crate::event_log::{DEFAULT_DISPLAY, DEFAULT_RETENTION};
use anyhow::{Context, Result};
use orchestra_core::command::DEFAULT_SHELL;
use orchestra_core::{resolve_layout, FsProbe, Layout, LayoutOverrides, PathProbe, ToolEnv};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const ROOT_ENV: &str = "ORCHESTRA_PROJECT_ROOT";
pub const SHELL_ENV: &str = "ORCHESTRA_SHELL";
pub const LOG_FILE_ENV: &str = "ORCHESTRA_LOG_FILE";
pub const EVENT_DISPLAY_ENV: &str = "ORCHESTRA_EVENT_DISPLAY";
pub const EVENT_RETENTION_ENV: &str = "ORCHESTRA_EVENT_RETENTION";
pub const TICK_ENV: &str = "ORCHESTRA_TICK_MS";
pub const WATCH_ENV: &str = "ORCHESTRA_WATCH";

pub const DEFAULT_TICK_MS: u64 = 250;
/// Rows the event panel may claim; larger requests are clamped.
pub const MAX_EVENT_DISPLAY: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    pub shell: String,
    pub tool_env: ToolEnv,
    pub event_display: usize,
    pub event_retention: usize,
    pub tick: Duration,
    pub watch_store: bool,
    pub log_file: Option<PathBuf>,
}

pub fn load_config() -> Result<Config> {
    let root = match non_empty(std::env::var(ROOT_ENV).ok()) {
        Some(root) => PathBuf::from(root),
        None => std::env::current_dir().context("resolving current directory")?,
    };
    Ok(config_from(&FsProbe, &root, |key| std::env::var(key).ok()))
}

/// Builds the configuration from an arbitrary variable lookup so tests do not
/// touch the process environment.
pub fn config_from(
    probe: &dyn PathProbe,
    root: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Config {
    let overrides = LayoutOverrides::from_lookup(&lookup);
    let layout = resolve_layout(probe, root, &overrides);

    let shell = non_empty(lookup(SHELL_ENV)).unwrap_or_else(|| DEFAULT_SHELL.to_string());
    let event_display =
        parse_count(&lookup, EVENT_DISPLAY_ENV, DEFAULT_DISPLAY).min(MAX_EVENT_DISPLAY);
    let event_retention =
        parse_count(&lookup, EVENT_RETENTION_ENV, DEFAULT_RETENTION).max(event_display);
    let tick = Duration::from_millis(parse_count(&lookup, TICK_ENV, DEFAULT_TICK_MS as usize) as u64);
    let watch_store = lookup(WATCH_ENV)
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false);
    let log_file = non_empty(lookup(LOG_FILE_ENV)).map(PathBuf::from);

    Config {
        layout,
        shell,
        tool_env: ToolEnv::default(),
        event_display,
        event_retention,
        tick,
        watch_store,
        log_file,
    }
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_count(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    let Some(raw) = non_empty(lookup(key)) else {
        return default;
    };
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => value,
        _ => {
            warn!(event = "config_invalid", key, value = %raw, default);
            default
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct NoFiles;

    impl PathProbe for NoFiles {
        fn is_file(&self, _path: &Path) -> bool {
            false
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&NoFiles, Path::new("/work"), lookup(&[]));
        assert_eq!(config.shell, "bash");
        assert_eq!(config.event_display, 5);
        assert_eq!(config.event_retention, 200);
        assert_eq!(config.tick, Duration::from_millis(250));
        assert!(!config.watch_store);
        assert!(config.log_file.is_none());
        assert_eq!(config.tool_env, ToolEnv::default());
        assert_eq!(config.layout.tasks, Path::new("/work/.claude/tasks.json"));
        assert_eq!(config.layout.script, Path::new("/work/../scripts/orchestrator.sh"));
    }

    #[test]
    fn overrides_are_read_from_lookup() {
        let config = config_from(
            &NoFiles,
            Path::new("/work"),
            lookup(&[
                ("ORCHESTRA_SHELL", "sh"),
                ("ORCHESTRA_SCRIPT", "tools/orch.sh"),
                ("ORCHESTRA_EVENT_DISPLAY", "8"),
                ("ORCHESTRA_TICK_MS", "100"),
                ("ORCHESTRA_WATCH", "on"),
                ("ORCHESTRA_LOG_FILE", "/tmp/control.log"),
            ]),
        );
        assert_eq!(config.shell, "sh");
        assert_eq!(config.layout.script, Path::new("/work/tools/orch.sh"));
        assert_eq!(config.event_display, 8);
        assert_eq!(config.tick, Duration::from_millis(100));
        assert!(config.watch_store);
        assert_eq!(config.log_file.as_deref(), Some(Path::new("/tmp/control.log")));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(
            &NoFiles,
            Path::new("/work"),
            lookup(&[
                ("ORCHESTRA_EVENT_DISPLAY", "lots"),
                ("ORCHESTRA_EVENT_RETENTION", "0"),
                ("ORCHESTRA_TICK_MS", "-5"),
            ]),
        );
        assert_eq!(config.event_display, 5);
        assert_eq!(config.event_retention, 200);
        assert_eq!(config.tick, Duration::from_millis(250));
    }

    #[test]
    fn retention_never_smaller_than_display() {
        let config = config_from(
            &NoFiles,
            Path::new("/work"),
            lookup(&[("ORCHESTRA_EVENT_DISPLAY", "20"), ("ORCHESTRA_EVENT_RETENTION", "3")]),
        );
        assert_eq!(config.event_retention, 20);
    }

    #[test]
    fn oversized_display_is_clamped() {
        let config = config_from(
            &NoFiles,
            Path::new("/work"),
            lookup(&[("ORCHESTRA_EVENT_DISPLAY", "70000")]),
        );
        assert_eq!(config.event_display, MAX_EVENT_DISPLAY);
        assert_eq!(config.event_retention, 200);
    }

    #[test]
    fn parse_bool_flag_accepts_common_spellings() {
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag(" YES "), Some(true));
        assert_eq!(parse_bool_flag("off"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
