use crate::app::{App, Tab};
use crate::task_list::TaskList;
use crate::theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

const INPUT_PROMPT: &str = "Add task: ";
const FILTER_PROMPT: &str = "Filter: ";

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let banner_height = if app.last_error().is_some() { 4 } else { 0 };
    let events_height = u16::try_from(app.event_display())
        .unwrap_or(u16::MAX)
        .saturating_add(2);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(6),
            Constraint::Length(events_height),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, app, rows[0]);
    if banner_height > 0 {
        render_error_banner(f, app, rows[1]);
    }

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    let tab = app.tab();
    render_task_list(f, app.pending_list_mut(), lists[0], tab == Tab::Pending);
    render_task_list(f, app.active_list_mut(), lists[1], tab == Tab::Active);

    render_events(f, app, rows[3]);
    render_footer(f, app, rows[4]);

    if app.show_help() {
        render_help(f, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Orchestra Control Center ", theme::HEADER_STYLE));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(28)])
        .split(inner);

    let selected = Tab::ALL.iter().position(|tab| *tab == app.tab()).unwrap_or(0);
    let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
        .select(selected)
        .style(theme::MUTED_STYLE)
        .highlight_style(theme::ACTIVE_TAB_STYLE)
        .divider("|");
    f.render_widget(tabs, columns[0]);

    let mut status = Vec::new();
    if app.in_flight() > 0 {
        status.push(Span::styled(
            format!("{} ", app.spinner_frame()),
            theme::ACTIVE_TAB_STYLE,
        ));
        status.push(Span::styled(
            format!("{} running", app.in_flight()),
            theme::MUTED_STYLE,
        ));
    } else if let Some(snapshot) = app.snapshot() {
        status.push(Span::styled(
            format!("{} tasks", snapshot.len()),
            theme::MUTED_STYLE,
        ));
    } else {
        status.push(Span::styled("Loading...", theme::MUTED_STYLE));
    }
    f.render_widget(
        Paragraph::new(Line::from(status)).alignment(Alignment::Right),
        columns[1],
    );
}

fn render_error_banner(f: &mut Frame, app: &App, area: Rect) {
    let Some(error) = app.last_error() else {
        return;
    };
    let mut lines = vec![Line::from(Span::styled(
        error.headline().to_string(),
        theme::ERROR_STYLE,
    ))];
    if let Some(first) = error.output.lines().find(|line| !line.trim().is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("Output: {}", first.trim()),
            theme::MUTED_STYLE,
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error")
        .border_style(Style::default().fg(Color::Red));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_task_list(f: &mut Frame, list: &mut TaskList, area: Rect, focused: bool) {
    let items: Vec<ListItem> = list
        .visible_items()
        .map(|item| {
            let title = Line::from(vec![
                Span::styled(
                    format!("{} ", theme::status_icon(item.status)),
                    Style::default().fg(theme::status_color(item.status)),
                ),
                Span::styled(
                    item.title.clone(),
                    Style::default()
                        .fg(theme::status_color(item.status))
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
            let description = Line::from(Span::styled(
                format!("  {}", item.description),
                theme::MUTED_STYLE,
            ));
            ListItem::new(vec![title, description])
        })
        .collect();

    let mut title = format!(" {} ({}) ", list.title(), list.visible_len());
    if list.has_filter() {
        title.push_str(&format!("[/{}] ", list.filter_text()));
    }
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border);

    let widget = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No tasks",
            theme::MUTED_STYLE,
        ))])
        .block(block)
    } else {
        let highlight = if focused {
            theme::SELECTED_STYLE
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol("> ")
    };
    f.render_stateful_widget(widget, area, list.state_mut());
}

fn render_events(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .events()
        .window(app.event_scroll(), app.event_display())
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    theme::MUTED_STYLE,
                ),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();

    let focused = app.tab() == Tab::EventLog;
    let mut title = format!(" Events ({}) ", app.events().len());
    if app.event_scroll() > 0 {
        title.push_str(&format!("+{} ", app.event_scroll()));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    let focused_list = match app.tab() {
        Tab::Pending => Some(app.pending_list()),
        Tab::Active => Some(app.active_list()),
        Tab::EventLog => None,
    };

    if app.is_input_active() {
        let input = app.input();
        let body = if input.is_empty() {
            Span::styled(input.placeholder(), theme::MUTED_STYLE)
        } else {
            Span::raw(input.value().to_string())
        };
        let line = Line::from(vec![Span::styled(INPUT_PROMPT, theme::HEADER_STYLE), body]);
        f.render_widget(Paragraph::new(line).block(block), area);
        let offset = (INPUT_PROMPT.len() + input.cursor()) as u16;
        f.set_cursor(
            (inner.x + offset).min(inner.right().saturating_sub(1)),
            inner.y,
        );
        return;
    }

    if let Some(list) = focused_list.filter(|list| list.is_filtering()) {
        let line = Line::from(vec![
            Span::styled(FILTER_PROMPT, theme::HEADER_STYLE),
            Span::raw(list.filter_text().to_string()),
        ]);
        f.render_widget(Paragraph::new(line).block(block), area);
        let offset = (FILTER_PROMPT.len() + list.filter_text().chars().count()) as u16;
        f.set_cursor(
            (inner.x + offset).min(inner.right().saturating_sub(1)),
            inner.y,
        );
        return;
    }

    let mut spans = Vec::new();
    for (key, label) in footer_hints(app.tab()) {
        spans.push(keycap(key));
        spans.push(Span::raw(format!(" {label}  ")));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn footer_hints(tab: Tab) -> Vec<(&'static str, &'static str)> {
    let mut hints = vec![("tab", "switch"), ("a", "add")];
    match tab {
        Tab::Pending => {
            hints.push(("s", "start"));
            hints.push(("d", "remove"));
        }
        Tab::Active => {
            hints.push(("c", "complete"));
            hints.push(("x", "stop"));
            hints.push(("d", "remove"));
        }
        Tab::EventLog => hints.push(("j/k", "scroll")),
    }
    hints.extend([("r", "refresh"), ("l", "logs"), ("?", "help"), ("q", "quit")]);
    hints
}

fn keycap(label: &str) -> Span<'_> {
    Span::styled(format!(" {label} "), theme::KEYCAP_STYLE)
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let rows = [
        ("Tab", "Cycle Pending / Active / Events"),
        ("a", "Add a task"),
        ("s", "Start selected pending task"),
        ("c", "Complete selected active task"),
        ("x", "Stop selected active task"),
        ("d / Backspace", "Remove selected task"),
        ("e", "Edit selected task (not available yet)"),
        ("r", "Refresh task list"),
        ("l", "Open live logs"),
        ("/", "Filter focused list"),
        ("j / k", "Move selection or scroll events"),
        ("Esc", "Close help or cancel"),
        ("?", "Toggle this help"),
        ("q / Ctrl-C", "Quit"),
    ];
    let mut lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (key, description) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{key:<15}"), Style::default().fg(Color::Cyan)),
            Span::raw(description),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}
