use crate::config::PreviewPosition;
use crate::tui::app::{App, Phase};
use crate::tui::theme::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw(f: &mut Frame, app: &mut App, theme: &Theme) {
    let (main, preview) = split_preview(f.area(), app);

    let header_rows = u16::from(app.config().header.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),           // Prompt
            Constraint::Length(1),           // Info
            Constraint::Length(header_rows), // Header
            Constraint::Min(0),              // List
        ])
        .split(main);

    draw_prompt(f, app, theme, chunks[0]);
    draw_info(f, app, theme, chunks[1]);
    if let Some(header) = &app.config().header {
        f.render_widget(Paragraph::new(header.as_str()).style(theme.header), chunks[2]);
    }
    draw_list(f, app, theme, chunks[3]);
    if let Some(area) = preview {
        draw_preview(f, app, theme, area);
    }
}

fn split_preview(area: Rect, app: &App) -> (Rect, Option<Rect>) {
    if !app.preview_visible {
        return (area, None);
    }
    let window = app.config().preview_window;
    let size = Constraint::Percentage(window.size);
    let rest = Constraint::Min(1);
    let (direction, preview_first) = match window.position {
        PreviewPosition::Right => (Direction::Horizontal, false),
        PreviewPosition::Left => (Direction::Horizontal, true),
        PreviewPosition::Down => (Direction::Vertical, false),
        PreviewPosition::Up => (Direction::Vertical, true),
    };
    let constraints = if preview_first { [size, rest] } else { [rest, size] };
    let chunks = Layout::default().direction(direction).constraints(constraints).split(area);
    if preview_first {
        (chunks[1], Some(chunks[0]))
    } else {
        (chunks[0], Some(chunks[1]))
    }
}

fn draw_prompt(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let prompt = app.config().prompt.as_str();
    let query = app.query_string();
    let line = Line::from(vec![Span::styled(prompt, theme.prompt), Span::styled(query, theme.query)]);
    f.render_widget(Paragraph::new(line), area);

    let before: String = app.query[..app.cursor].iter().collect();
    let x = Span::raw(prompt).width() + Span::raw(before).width();
    f.set_cursor_position((area.x + (x as u16).min(area.width.saturating_sub(1)), area.y));
}

fn draw_info(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let spinner = match app.phase {
        Phase::Idle | Phase::Loading => SPINNER[app.spinner % SPINNER.len()],
        _ => ' ',
    };
    let mut info = format!("{} {}/{}", spinner, app.merger.len(), app.item_count);
    if app.multi() {
        info.push_str(&format!(" ({})", app.selected_count()));
    }
    if !app.sort && app.config().rank.sort_cap.is_some() {
        info.push_str(" -S");
    }
    if let Some(percent) = app.rank_progress {
        info.push_str(&format!(" ({}%)", percent));
    }
    let mut spans = vec![Span::styled(info, theme.info)];
    if let Some(err) = &app.reader_error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!("[{}]", err), theme.error));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_list(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    app.list_top = area.y;
    app.list_height = area.height as usize;
    app.scroll_to_current();

    let pattern = app.merger_pattern.clone();
    let mut lines = Vec::with_capacity(area.height as usize);
    for row in 0..area.height as usize {
        let idx = app.offset + row;
        let Some(result) = app.merger.get(idx) else {
            break;
        };
        let is_current = idx == app.current;
        let (base, hit) = if is_current {
            (theme.current, theme.current_matched)
        } else {
            (Style::default(), theme.matched)
        };

        let mut positions = pattern
            .match_item(&result.item, true, &mut app.slab)
            .map(|m| m.positions)
            .unwrap_or_default();
        positions.sort_unstable();

        let mut spans = vec![
            Span::styled(if is_current { ">" } else { " " }, theme.cursor),
            Span::styled(if app.is_selected(result.index()) { ">" } else { " " }, theme.marker),
        ];
        spans.extend(highlight(&result.item.text().to_string(), &positions, base, hit));
        lines.push(Line::from(spans).style(base));
    }
    f.render_widget(Paragraph::new(Text::from(lines)), area);
}

/// Split `text` into runs of matched and unmatched characters
fn highlight(text: &str, positions: &[usize], base: Style, hit: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_hit = false;
    let mut next = positions.iter().peekable();
    for (i, c) in text.chars().enumerate() {
        let is_hit = next.next_if(|&&p| p == i).is_some();
        if is_hit != run_hit && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), if run_hit { hit } else { base }));
        }
        run_hit = is_hit;
        // Tabs and control characters would corrupt the row
        run.push(if c.is_control() { ' ' } else { c });
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, if run_hit { hit } else { base }));
    }
    spans
}

fn draw_preview(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let block = Block::default().borders(Borders::ALL).border_style(theme.border);
    app.preview_height = area.height.saturating_sub(2);

    let paragraph = match &app.preview {
        Some(Ok(text)) => Paragraph::new(text.replace('\t', "    ")),
        Some(Err(err)) => Paragraph::new(err.as_str()).style(theme.error),
        None => Paragraph::new(""),
    };
    f.render_widget(
        paragraph
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((app.preview_scroll, 0)),
        area,
    );
}
