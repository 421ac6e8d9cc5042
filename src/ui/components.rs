//! Small layout and text helpers shared by the draw functions.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Span,
};

/// Key/action pairs rendered as `key action │ key action │ ...`.
pub fn key_hints<'a>(hints: &[(&'a str, &'a str)], key: Color, label: Color) -> Vec<Span<'a>> {
    hints
        .iter()
        .enumerate()
        .flat_map(|(i, (k, action))| {
            let sep = if i + 1 == hints.len() { "" } else { " │ " };
            vec![
                Span::styled(*k, Style::default().fg(key)),
                Span::styled(format!(" {}{}", action, sep), Style::default().fg(label)),
            ]
        })
        .collect()
}

/// Number of lines to skip so the last line of `text` stays visible in a
/// box `height` rows tall.
pub fn tail_scroll(text: &str, height: u16) -> u16 {
    let mut lines = text.split('\n').count();
    if text.is_empty() {
        lines = 1;
    }
    lines.saturating_sub(height as usize).min(u16::MAX as usize) as u16
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
