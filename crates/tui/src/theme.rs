use olla_core::diag::Level;
use ratatui::style::Color;

pub struct Theme {
    pub border_focus: Color,
    pub border_inactive: Color,
    pub chat_border: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub user: Color,
    pub assistant: Color,
    pub pending: Color,
    pub code: Color,
    pub heading: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Cyan,
    border_inactive: Color::DarkGray,
    chat_border: Color::DarkGray,
    selected_fg: Color::Black,
    selected_bg: Color::Cyan,
    user: Color::Green,
    assistant: Color::Magenta,
    pending: Color::DarkGray,
    code: Color::Yellow,
    heading: Color::Cyan,
};

impl Theme {
    pub fn level(&self, level: Level) -> Color {
        match level {
            Level::Info => Color::Blue,
            Level::Success => Color::Green,
            Level::Warning => Color::Yellow,
            Level::Error => Color::Red,
        }
    }
}
