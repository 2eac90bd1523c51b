use ratatui::style::{Color, Modifier, Style};

/// Styles used by the renderer. Built once when the loop starts.
#[derive(Debug, Clone)]
pub struct Theme {
    pub prompt: Style,
    pub query: Style,
    pub info: Style,
    pub header: Style,
    pub current: Style,
    pub matched: Style,
    pub current_matched: Style,
    pub marker: Style,
    pub cursor: Style,
    pub border: Style,
    pub error: Style,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        if color { Self::colored() } else { Self::monochrome() }
    }

    fn colored() -> Self {
        Self {
            prompt: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            query: Style::default(),
            info: Style::default().fg(Color::Yellow),
            header: Style::default().fg(Color::Cyan),
            current: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            matched: Style::default().fg(Color::Green),
            current_matched: Style::default()
                .fg(Color::LightGreen)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            marker: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            cursor: Style::default().fg(Color::Red).bg(Color::DarkGray),
            border: Style::default().fg(Color::DarkGray),
            error: Style::default().fg(Color::Red),
        }
    }

    fn monochrome() -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Self {
            prompt: Style::default(),
            query: Style::default(),
            info: Style::default(),
            header: Style::default(),
            current: Style::default().add_modifier(Modifier::REVERSED),
            matched: Style::default().add_modifier(Modifier::UNDERLINED),
            current_matched: Style::default().add_modifier(Modifier::REVERSED | Modifier::UNDERLINED),
            marker: bold,
            cursor: bold,
            border: Style::default(),
            error: bold,
        }
    }
}
