use crossterm::event::{KeyCode, KeyEvent};
use orchestra_core::{Task, TaskId, TaskStatus};
use ratatui::widgets::ListState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

impl TaskItem {
    pub fn from_task(task: &Task) -> Self {
        let prefix = if task.status == TaskStatus::Failed {
            "[FAILED] "
        } else {
            ""
        };
        let title = format!("{prefix}#{} {}", task.id, task.agent);
        Self {
            id: task.id,
            title: title.trim_end().to_string(),
            description: task.description.clone(),
            status: task.status,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterState {
    #[default]
    Unfiltered,
    Filtering,
    Applied,
}

/// Selectable, filterable list of task rows. Selection indexes the visible
/// (filtered) rows.
#[derive(Debug, Clone)]
pub struct TaskList {
    title: &'static str,
    items: Vec<TaskItem>,
    visible: Vec<usize>,
    state: ListState,
    filter: String,
    filter_state: FilterState,
}

impl TaskList {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            items: Vec::new(),
            visible: Vec::new(),
            state: ListState::default(),
            filter: String::new(),
            filter_state: FilterState::Unfiltered,
        }
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Replaces the rows, keeping the selection on the same task id when it
    /// survives.
    pub fn set_items(&mut self, items: Vec<TaskItem>) {
        let selected_id = self.selected_item().map(|item| item.id);
        self.items = items;
        self.recompute_visible();
        self.restore_selection(selected_id);
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &TaskItem> {
        self.visible.iter().filter_map(|idx| self.items.get(*idx))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn selected_item(&self) -> Option<&TaskItem> {
        let idx = self.state.selected()?;
        let item_idx = self.visible.get(idx)?;
        self.items.get(*item_idx)
    }

    /// Id of the selected row; id 0 is treated as no selection.
    pub fn selected_id(&self) -> Option<TaskId> {
        self.selected_item().map(|item| item.id).filter(|id| *id > 0)
    }

    pub fn state_mut(&mut self) -> &mut ListState {
        &mut self.state
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }

        let current = self.state.selected().unwrap_or(0) as isize;
        let len = self.visible.len() as isize;
        let mut next = current + delta;
        if next < 0 {
            next = len - 1;
        }
        if next >= len {
            next = 0;
        }
        self.state.select(Some(next as usize));
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter_state
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filter_state == FilterState::Filtering
    }

    pub fn has_filter(&self) -> bool {
        self.filter_state != FilterState::Unfiltered
    }

    pub fn begin_filter(&mut self) {
        self.filter_state = FilterState::Filtering;
    }

    pub fn clear_filter(&mut self) {
        let selected_id = self.selected_item().map(|item| item.id);
        self.filter.clear();
        self.filter_state = FilterState::Unfiltered;
        self.recompute_visible();
        self.restore_selection(selected_id);
    }

    /// Routes a key to the filter prompt. Only meaningful while filtering.
    pub fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                if self.filter.is_empty() {
                    self.filter_state = FilterState::Unfiltered;
                } else {
                    self.filter_state = FilterState::Applied;
                }
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.refilter();
            }
            KeyCode::Char(ch) => {
                self.filter.push(ch);
                self.refilter();
            }
            _ => {}
        }
    }

    fn refilter(&mut self) {
        self.recompute_visible();
        if self.visible.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    fn recompute_visible(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| needle.is_empty() || item.matches(&needle))
            .map(|(idx, _)| idx)
            .collect();
    }

    fn restore_selection(&mut self, selected_id: Option<TaskId>) {
        if let Some(id) = selected_id {
            let position = self
                .visible
                .iter()
                .position(|idx| self.items.get(*idx).map(|item| item.id) == Some(id));
            if let Some(position) = position {
                self.state.select(Some(position));
                return;
            }
        }

        if self.visible.is_empty() {
            self.state.select(None);
            return;
        }

        match self.state.selected() {
            Some(index) if index < self.visible.len() => {}
            Some(_) => self.state.select(Some(self.visible.len() - 1)),
            None => self.state.select(Some(0)),
        }
    }
}
