use orchestra_core::TaskStatus;
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const ACTIVE_TAB_STYLE: Style = Style::new()
    .fg(Color::Rgb(250, 189, 47))
    .add_modifier(Modifier::BOLD);
pub const MUTED_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));
pub const ERROR_STYLE: Style = Style::new()
    .fg(Color::Rgb(251, 73, 52))
    .add_modifier(Modifier::BOLD);
pub const KEYCAP_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Rgb(189, 174, 147))
    .add_modifier(Modifier::BOLD);

pub mod icons {
    pub const PENDING: &str = ".";
    pub const IN_PROGRESS: &str = ">";
    pub const COMPLETED: &str = "x";
    pub const FAILED: &str = "!";
}

pub fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => icons::PENDING,
        TaskStatus::InProgress => icons::IN_PROGRESS,
        TaskStatus::Completed => icons::COMPLETED,
        TaskStatus::Failed => icons::FAILED,
    }
}

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Rgb(146, 131, 116),
        TaskStatus::InProgress => Color::Rgb(131, 165, 152),
        TaskStatus::Completed => Color::Rgb(184, 187, 38),
        TaskStatus::Failed => Color::Rgb(251, 73, 52),
    }
}
