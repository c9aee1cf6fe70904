//! Dashboard state machine.
//!
//! Key presses, command results and ticks all arrive as [`Message`]s and are
//! folded into [`App`] one at a time. A transition never blocks; anything that
//! needs the outside world comes back out as an [`Effect`] for the runtime to
//! carry out, and its outcome returns later as another message.

use crate::event_log::EventLog;
use crate::input::{InputField, DEFAULT_CHAR_LIMIT};
use crate::keymap::{self, Intent};
use crate::task_list::{TaskItem, TaskList};
use crossterm::event::{KeyCode, KeyEvent};
use orchestra_core::{CommandResult, Diagnostic, Snapshot, TaskCommand, TaskId};
use tracing::debug;

pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Pending,
    Active,
    EventLog,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Pending, Tab::Active, Tab::EventLog];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Pending => "Pending",
            Tab::Active => "Active",
            Tab::EventLog => "Events",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Pending => Tab::Active,
            Tab::Active => Tab::EventLog,
            Tab::EventLog => Tab::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    InputActive,
}

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    CommandFinished {
        command: TaskCommand,
        result: CommandResult,
    },
    LogViewerExited(Result<(), Diagnostic>),
    StoreChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Dispatch(TaskCommand),
    OpenLogViewer,
    Quit,
}

pub struct App {
    tab: Tab,
    mode: Mode,
    input: InputField,
    pending: TaskList,
    active: TaskList,
    events: EventLog,
    event_scroll: usize,
    event_display: usize,
    last_error: Option<Diagnostic>,
    snapshot: Option<Snapshot>,
    in_flight: usize,
    spinner: usize,
    show_help: bool,
    size: (u16, u16),
    should_quit: bool,
}

impl App {
    pub fn new(event_display: usize, event_retention: usize) -> Self {
        let mut input = InputField::new("Task description...", DEFAULT_CHAR_LIMIT);
        input.blur();
        Self {
            tab: Tab::Pending,
            mode: Mode::Normal,
            input,
            pending: TaskList::new("Pending Tasks"),
            active: TaskList::new("Active / Recent"),
            events: EventLog::new(event_retention),
            event_scroll: 0,
            event_display: event_display.max(1),
            last_error: None,
            snapshot: None,
            in_flight: 0,
            spinner: 0,
            show_help: false,
            size: (0, 0),
            should_quit: false,
        }
    }

    /// Effects to run once before the first message: the initial load.
    pub fn init(&mut self) -> Vec<Effect> {
        vec![self.dispatch(TaskCommand::Fetch)]
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_input_active(&self) -> bool {
        self.mode == Mode::InputActive
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn pending_list(&self) -> &TaskList {
        &self.pending
    }

    pub fn active_list(&self) -> &TaskList {
        &self.active
    }

    pub fn pending_list_mut(&mut self) -> &mut TaskList {
        &mut self.pending
    }

    pub fn active_list_mut(&mut self) -> &mut TaskList {
        &mut self.active
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn event_scroll(&self) -> usize {
        self.event_scroll
    }

    pub fn event_display(&self) -> usize {
        self.event_display
    }

    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner % SPINNER_FRAMES.len()]
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize(width, height) => {
                self.size = (width, height);
                Vec::new()
            }
            Message::Tick => {
                if self.in_flight > 0 {
                    self.spinner = self.spinner.wrapping_add(1);
                }
                Vec::new()
            }
            Message::CommandFinished { command, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_command_finished(&command, result);
                Vec::new()
            }
            Message::LogViewerExited(result) => {
                if let Err(diagnostic) = result {
                    self.record_failure(diagnostic);
                }
                Vec::new()
            }
            Message::StoreChanged => vec![self.dispatch(TaskCommand::Fetch)],
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match self.mode {
            Mode::InputActive => self.handle_input_key(key),
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter => {
                let description = self.input.value().to_string();
                self.leave_input();
                if description.is_empty() {
                    return Vec::new();
                }
                self.events.push(format!("Adding task: {description}..."));
                vec![self.dispatch(TaskCommand::add(description))]
            }
            KeyCode::Esc => {
                self.leave_input();
                Vec::new()
            }
            _ => {
                self.input.handle_key(key);
                Vec::new()
            }
        }
    }

    /// Ctrl-C quits from here even while a list filter is capturing keys; in
    /// input mode it is just another key for the text field.
    fn handle_normal_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if keymap::is_interrupt(&key) {
            return self.quit();
        }
        if let Some(list) = self.focused_list_mut() {
            if list.is_filtering() {
                list.handle_filter_key(key);
                return Vec::new();
            }
        }

        match keymap::normal_intent(&key) {
            Some(intent) => self.apply_intent(intent),
            None => Vec::new(),
        }
    }

    pub fn apply_intent(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::CycleTab => {
                self.tab = self.tab.next();
                Vec::new()
            }
            Intent::BeginAdd => {
                self.mode = Mode::InputActive;
                self.input.focus();
                Vec::new()
            }
            Intent::StartSelected => self.dispatch_selected(Tab::Pending, "Starting", TaskCommand::Start),
            Intent::CompleteSelected => {
                self.dispatch_selected(Tab::Active, "Completing", TaskCommand::Complete)
            }
            Intent::StopSelected => self.dispatch_selected(Tab::Active, "Stopping", TaskCommand::Stop),
            Intent::RemoveSelected => self.dispatch_selected(self.tab, "Removing", TaskCommand::Remove),
            Intent::Refresh => {
                self.events.push("Scanning tasks...");
                vec![self.dispatch(TaskCommand::Fetch)]
            }
            Intent::OpenLogViewer => vec![Effect::OpenLogViewer],
            Intent::Quit => self.quit(),
            Intent::Escape => {
                self.show_help = false;
                Vec::new()
            }
            Intent::EditSelected => {
                self.events.push("[Edit] Not implemented yet.");
                Vec::new()
            }
            Intent::BeginFilter => {
                if let Some(list) = self.focused_list_mut() {
                    list.begin_filter();
                }
                Vec::new()
            }
            Intent::SelectNext => {
                match self.focused_list_mut() {
                    Some(list) => list.select_next(),
                    None => self.scroll_events(1),
                }
                Vec::new()
            }
            Intent::SelectPrev => {
                match self.focused_list_mut() {
                    Some(list) => list.select_prev(),
                    None => self.scroll_events(-1),
                }
                Vec::new()
            }
            Intent::ToggleHelp => {
                self.show_help = !self.show_help;
                Vec::new()
            }
        }
    }

    /// Lifecycle action on the selected row of `tab`'s list. Does nothing when
    /// the user is on another tab or nothing resolvable is selected.
    fn dispatch_selected(
        &mut self,
        tab: Tab,
        verb: &str,
        build: fn(TaskId) -> TaskCommand,
    ) -> Vec<Effect> {
        if self.tab != tab {
            return Vec::new();
        }
        let Some(id) = self.selected_task_id(tab) else {
            return Vec::new();
        };
        self.events.push(format!("{verb} task #{id}..."));
        vec![self.dispatch(build(id))]
    }

    fn selected_task_id(&self, tab: Tab) -> Option<TaskId> {
        match tab {
            Tab::Pending => self.pending.selected_id(),
            Tab::Active => self.active.selected_id(),
            Tab::EventLog => None,
        }
    }

    fn focused_list_mut(&mut self) -> Option<&mut TaskList> {
        match self.tab {
            Tab::Pending => Some(&mut self.pending),
            Tab::Active => Some(&mut self.active),
            Tab::EventLog => None,
        }
    }

    fn scroll_events(&mut self, delta: isize) {
        let max = self.events.len().saturating_sub(self.event_display);
        self.event_scroll = if delta < 0 {
            self.event_scroll.saturating_sub(delta.unsigned_abs())
        } else {
            (self.event_scroll + delta as usize).min(max)
        };
    }

    fn dispatch(&mut self, command: TaskCommand) -> Effect {
        self.in_flight += 1;
        debug!(
            event = "dispatch",
            verb = command.verb(),
            task_id = command.task_id(),
            in_flight = self.in_flight
        );
        Effect::Dispatch(command)
    }

    fn leave_input(&mut self) {
        self.input.clear();
        self.input.blur();
        self.mode = Mode::Normal;
    }

    fn quit(&mut self) -> Vec<Effect> {
        self.should_quit = true;
        vec![Effect::Quit]
    }

    fn on_command_finished(&mut self, command: &TaskCommand, result: CommandResult) {
        match result {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(diagnostic) => {
                debug!(event = "command_failed", verb = command.verb(), message = %diagnostic.headline());
                self.record_failure(diagnostic);
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.pending
            .set_items(snapshot.pending().map(TaskItem::from_task).collect());
        self.active
            .set_items(snapshot.active().map(TaskItem::from_task).collect());
        self.snapshot = Some(snapshot);
        self.last_error = None;
        self.events.push("Tasks refreshed.");
    }

    fn record_failure(&mut self, diagnostic: Diagnostic) {
        self.events.push(format!("Error: {}", diagnostic.headline()));
        self.last_error = Some(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use orchestra_core::{Task, TaskStatus};

    fn app() -> App {
        App::new(5, 200)
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(key(KeyCode::Char(ch)));
        }
    }

    fn loaded(tasks: Vec<Task>) -> Message {
        Message::CommandFinished {
            command: TaskCommand::Fetch,
            result: Ok(Snapshot::new(tasks)),
        }
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new(1, "Fix TUI layout", TaskStatus::Pending),
            Task::new(2, "Refactor API", TaskStatus::InProgress).with_agent("backend"),
            Task::new(3, "Ship docs", TaskStatus::Completed).with_agent("docs"),
            Task::new(4, "Flaky e2e", TaskStatus::Failed).with_agent("qa"),
            Task::new(5, "Add auth logic", TaskStatus::Pending),
        ]
    }

    fn failure(message: &str) -> Message {
        Message::CommandFinished {
            command: TaskCommand::Start(1),
            result: Err(Diagnostic::new(message, "tool output")),
        }
    }

    #[test]
    fn init_requests_initial_fetch() {
        let mut app = app();
        assert_eq!(app.init(), vec![Effect::Dispatch(TaskCommand::Fetch)]);
        assert_eq!(app.in_flight(), 1);
        assert!(!app.is_loaded());
    }

    #[test]
    fn tab_cycles_through_three_views() {
        let mut app = app();
        let start = app.tab();
        let mut seen = Vec::new();
        for _ in 0..3 {
            app.update(key(KeyCode::Tab));
            seen.push(app.tab());
        }
        assert_eq!(seen, vec![Tab::Active, Tab::EventLog, Tab::Pending]);
        assert_eq!(app.tab(), start);
    }

    #[test]
    fn cancel_always_clears_input() {
        for text in ["", "half typed", "q"] {
            let mut app = app();
            app.update(key(KeyCode::Char('a')));
            assert!(app.is_input_active());
            assert!(app.input().is_focused());
            type_text(&mut app, text);
            app.update(key(KeyCode::Esc));
            assert_eq!(app.mode(), Mode::Normal);
            assert!(app.input().is_empty());
            assert!(!app.should_quit());
        }
    }

    #[test]
    fn confirming_empty_input_dispatches_nothing() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        let effects = app.update(key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.events().iter().all(|e| !e.message.starts_with("Adding task")));
    }

    #[test]
    fn confirming_text_dispatches_add_with_exact_description() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "Integration Test Task");
        let effects = app.update(key(KeyCode::Enter));

        assert_eq!(
            effects,
            vec![Effect::Dispatch(TaskCommand::add("Integration Test Task"))]
        );
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Adding task: Integration Test Task...")
        );
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.input().is_empty());
    }

    #[test]
    fn confirmed_description_is_not_trimmed() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "  Integration Test Task  ");
        assert_eq!(
            app.update(key(KeyCode::Enter)),
            vec![Effect::Dispatch(TaskCommand::add("  Integration Test Task  "))]
        );
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Adding task:   Integration Test Task  ...")
        );

        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, " ");
        assert_eq!(
            app.update(key(KeyCode::Enter)),
            vec![Effect::Dispatch(TaskCommand::add(" "))]
        );
    }

    #[test]
    fn edit_key_reports_not_implemented() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        assert!(app.update(key(KeyCode::Char('e'))).is_empty());
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("[Edit] Not implemented yet.")
        );
        assert_eq!(app.in_flight(), 0);
        assert_eq!(app.mode(), Mode::Normal);
    }

    #[test]
    fn command_keys_are_text_while_input_is_active() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "qsr");
        assert!(!app.should_quit());
        assert_eq!(app.input().value(), "qsr");
        assert_eq!(app.in_flight(), 0);
    }

    #[test]
    fn escape_in_normal_mode_does_not_quit() {
        let mut app = app();
        let effects = app.update(key(KeyCode::Esc));
        assert!(effects.is_empty());
        assert!(!app.should_quit());
    }

    #[test]
    fn quit_keys_terminate() {
        let mut app = app();
        assert_eq!(app.update(key(KeyCode::Char('q'))), vec![Effect::Quit]);
        assert!(app.should_quit());

        let mut app = self::app();
        let ctrl_c = Message::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.update(ctrl_c), vec![Effect::Quit]);
    }

    #[test]
    fn ctrl_c_while_typing_keeps_the_buffer() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "half typed");
        let ctrl_c = Message::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert!(app.update(ctrl_c).is_empty());
        assert!(!app.should_quit());
        assert_eq!(app.mode(), Mode::InputActive);
        assert_eq!(app.input().value(), "half typed");
    }

    #[test]
    fn ctrl_c_quits_while_filtering() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Char('/')));
        let ctrl_c = Message::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.update(ctrl_c), vec![Effect::Quit]);
    }

    #[test]
    fn fetch_result_rebuilds_projections() {
        let mut app = app();
        app.update(loaded(sample_tasks()));

        let pending: Vec<_> = app.pending_list().items().iter().map(|i| i.id).collect();
        let active: Vec<_> = app.active_list().items().iter().map(|i| i.id).collect();
        assert_eq!(pending, vec![1, 5]);
        assert_eq!(active, vec![2, 4]);
        let failed: Vec<_> = app
            .active_list()
            .items()
            .iter()
            .filter(|i| i.is_failed())
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(failed, vec!["[FAILED] #4 qa"]);
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Tasks refreshed.")
        );
        assert!(app.is_loaded());
    }

    #[test]
    fn start_requires_pending_tab_and_selection() {
        let mut app = app();
        assert!(app.update(key(KeyCode::Char('s'))).is_empty());

        app.update(loaded(sample_tasks()));
        let effects = app.update(key(KeyCode::Char('s')));
        assert_eq!(effects, vec![Effect::Dispatch(TaskCommand::Start(1))]);
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Starting task #1...")
        );

        app.update(key(KeyCode::Tab));
        assert!(app.update(key(KeyCode::Char('s'))).is_empty());
    }

    #[test]
    fn complete_and_stop_act_on_active_tab_only() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        assert!(app.update(key(KeyCode::Char('c'))).is_empty());
        assert!(app.update(key(KeyCode::Char('x'))).is_empty());

        app.update(key(KeyCode::Tab));
        app.update(key(KeyCode::Char('j')));
        assert_eq!(
            app.update(key(KeyCode::Char('c'))),
            vec![Effect::Dispatch(TaskCommand::Complete(4))]
        );
        assert_eq!(
            app.update(key(KeyCode::Char('x'))),
            vec![Effect::Dispatch(TaskCommand::Stop(4))]
        );
        let messages = app.events().messages();
        assert_eq!(messages[0], "Stopping task #4...");
        assert_eq!(messages[1], "Completing task #4...");
    }

    #[test]
    fn remove_uses_current_tab_list() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Char('j')));
        assert_eq!(
            app.update(key(KeyCode::Char('d'))),
            vec![Effect::Dispatch(TaskCommand::Remove(5))]
        );

        app.update(key(KeyCode::Tab));
        assert_eq!(
            app.update(key(KeyCode::Backspace)),
            vec![Effect::Dispatch(TaskCommand::Remove(2))]
        );

        app.update(key(KeyCode::Tab));
        assert!(app.update(key(KeyCode::Char('d'))).is_empty());
    }

    #[test]
    fn refresh_logs_and_fetches() {
        let mut app = app();
        let effects = app.update(key(KeyCode::Char('r')));
        assert_eq!(effects, vec![Effect::Dispatch(TaskCommand::Fetch)]);
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Scanning tasks...")
        );
    }

    #[test]
    fn log_viewer_is_an_effect_and_its_failure_is_recorded() {
        let mut app = app();
        assert_eq!(app.update(key(KeyCode::Char('l'))), vec![Effect::OpenLogViewer]);
        app.update(Message::LogViewerExited(Err(Diagnostic::message(
            "log viewer failed: exit status: 2",
        ))));
        assert_eq!(
            app.last_error().map(|d| d.message.as_str()),
            Some("log viewer failed: exit status: 2")
        );
    }

    #[test]
    fn failure_touches_only_error_and_log() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Tab));
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "draft");

        let tab = app.tab();
        let mode = app.mode();
        let pending_sel = app.pending_list().selected_index();
        let active_sel = app.active_list().selected_index();
        let events_before = app.events().len();

        app.update(failure("start task failed: exit status: 1"));

        assert_eq!(app.tab(), tab);
        assert_eq!(app.mode(), mode);
        assert_eq!(app.input().value(), "draft");
        assert_eq!(app.pending_list().selected_index(), pending_sel);
        assert_eq!(app.active_list().selected_index(), active_sel);
        assert_eq!(app.events().len(), events_before + 1);
        assert_eq!(
            app.events().latest().map(|e| e.message.as_str()),
            Some("Error: start task failed: exit status: 1")
        );
        assert_eq!(app.last_error().map(|d| d.output.as_str()), Some("tool output"));
    }

    #[test]
    fn failed_start_keeps_the_starting_entry() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Char('s')));
        app.update(failure("start task failed: exit status: 1"));
        let messages = app.events().messages();
        assert_eq!(messages[0], "Error: start task failed: exit status: 1");
        assert_eq!(messages[1], "Starting task #1...");
    }

    #[test]
    fn successful_fetch_clears_sticky_error() {
        let mut app = app();
        app.update(failure("list tasks failed"));
        assert!(app.last_error().is_some());
        app.update(loaded(Vec::new()));
        assert!(app.last_error().is_none());
    }

    #[test]
    fn results_fold_regardless_of_arrival_order() {
        let mut app = app();
        app.init();
        app.update(key(KeyCode::Char('r')));
        assert_eq!(app.in_flight(), 2);

        app.update(loaded(vec![Task::new(1, "new", TaskStatus::Pending)]));
        app.update(loaded(vec![Task::new(1, "old", TaskStatus::InProgress)]));

        assert_eq!(app.in_flight(), 0);
        let snapshot = app.snapshot().unwrap();
        assert_eq!(snapshot.tasks[0].description, "old");
        assert!(app.pending_list().items().is_empty());
        assert_eq!(app.active_list().items().len(), 1);
    }

    #[test]
    fn results_arriving_during_input_do_not_disturb_it() {
        let mut app = app();
        app.update(key(KeyCode::Char('a')));
        type_text(&mut app, "Write");
        app.update(loaded(sample_tasks()));
        type_text(&mut app, " docs");
        assert!(app.is_input_active());
        assert_eq!(app.input().value(), "Write docs");
        assert_eq!(app.pending_list().items().len(), 2);
    }

    #[test]
    fn filter_mode_captures_keys_and_slash_escape_clears_it() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Char('/')));
        type_text(&mut app, "auth");
        assert!(!app.should_quit());
        assert_eq!(app.pending_list().visible_len(), 1);

        app.update(key(KeyCode::Enter));
        assert_eq!(
            app.update(key(KeyCode::Char('s'))),
            vec![Effect::Dispatch(TaskCommand::Start(5))]
        );

        app.update(key(KeyCode::Esc));
        assert_eq!(app.pending_list().visible_len(), 1);
        assert!(!app.should_quit());

        app.update(key(KeyCode::Char('/')));
        app.update(key(KeyCode::Esc));
        assert_eq!(app.pending_list().visible_len(), 2);
    }

    #[test]
    fn escape_closes_help_without_touching_lists() {
        let mut app = app();
        app.update(loaded(sample_tasks()));
        app.update(key(KeyCode::Char('?')));
        assert!(app.show_help());
        assert!(app.update(key(KeyCode::Esc)).is_empty());
        assert!(!app.show_help());
        assert_eq!(app.pending_list().visible_len(), 2);
    }

    #[test]
    fn event_tab_scrolls_within_retained_history() {
        let mut app = App::new(2, 200);
        for _ in 0..4 {
            app.update(key(KeyCode::Char('r')));
        }
        app.update(key(KeyCode::Tab));
        app.update(key(KeyCode::Tab));
        assert_eq!(app.tab(), Tab::EventLog);

        for _ in 0..5 {
            app.update(key(KeyCode::Down));
        }
        assert_eq!(app.event_scroll(), 2);
        app.update(key(KeyCode::Up));
        assert_eq!(app.event_scroll(), 1);
    }

    #[test]
    fn spinner_only_advances_while_busy() {
        let mut app = app();
        let idle = app.spinner_frame();
        app.update(Message::Tick);
        assert_eq!(app.spinner_frame(), idle);

        app.init();
        app.update(Message::Tick);
        assert_ne!(app.spinner_frame(), idle);
    }

    #[test]
    fn store_change_triggers_quiet_fetch() {
        let mut app = app();
        assert_eq!(
            app.update(Message::StoreChanged),
            vec![Effect::Dispatch(TaskCommand::Fetch)]
        );
        assert!(app.events().is_empty());
    }
}
