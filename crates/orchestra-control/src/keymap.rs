use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press means while the dashboard is in command mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CycleTab,
    BeginAdd,
    StartSelected,
    CompleteSelected,
    StopSelected,
    RemoveSelected,
    EditSelected,
    Refresh,
    OpenLogViewer,
    Quit,
    Escape,
    BeginFilter,
    SelectNext,
    SelectPrev,
    ToggleHelp,
}

pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

pub fn normal_intent(key: &KeyEvent) -> Option<Intent> {
    if is_interrupt(key) {
        return Some(Intent::Quit);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }

    let intent = match key.code {
        KeyCode::Tab => Intent::CycleTab,
        KeyCode::Char('a') => Intent::BeginAdd,
        KeyCode::Char('s') => Intent::StartSelected,
        KeyCode::Char('c') => Intent::CompleteSelected,
        KeyCode::Char('x') => Intent::StopSelected,
        KeyCode::Char('d') | KeyCode::Backspace => Intent::RemoveSelected,
        KeyCode::Char('e') => Intent::EditSelected,
        KeyCode::Char('r') => Intent::Refresh,
        KeyCode::Char('l') => Intent::OpenLogViewer,
        KeyCode::Char('q') => Intent::Quit,
        KeyCode::Esc => Intent::Escape,
        KeyCode::Char('/') => Intent::BeginFilter,
        KeyCode::Char('j') | KeyCode::Down => Intent::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Intent::SelectPrev,
        KeyCode::Char('?') | KeyCode::F(1) => Intent::ToggleHelp,
        _ => return None,
    };
    Some(intent)
}
