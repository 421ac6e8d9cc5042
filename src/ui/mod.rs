mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Field, Popup};
use crate::status::{HealthState, MessageKind};
use components::{centered_rect, key_hints, tail_scroll};

/// Most status messages shown at once; older ones scroll off the top.
const MAX_VISIBLE_MESSAGES: usize = 4;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let visible_messages = app.messages.messages().len().clamp(1, MAX_VISIBLE_MESSAGES) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),                    // Health line
            Constraint::Min(5),                       // Markdown editor
            Constraint::Length(3),                    // Filename + convert button
            Constraint::Length(visible_messages + 2), // Status messages
            Constraint::Length(1),                    // Stats line
            Constraint::Length(1),                    // Footer
        ])
        .split(area);

    draw_health_line(f, app, chunks[0]);
    draw_editor(f, app, chunks[1]);
    draw_form_row(f, app, chunks[2]);
    draw_messages(f, app, chunks[3]);
    draw_stats_line(f, app, chunks[4]);
    draw_footer(f, app, chunks[5]);

    if app.popup == Popup::Help {
        draw_help_popup(f, app);
    }
}

fn draw_health_line(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let color = match app.health.state {
        HealthState::Checking => t.warning,
        HealthState::Healthy => t.success,
        HealthState::Unhealthy => t.danger,
    };

    let line = Line::from(vec![
        Span::styled(" mdpdf ", Style::default().fg(t.accent).add_modifier(Modifier::BOLD)),
        Span::styled("│ ", Style::default().fg(t.inactive)),
        Span::styled(app.server_url.as_str(), Style::default().fg(t.text_dim)),
        Span::styled(" │ ", Style::default().fg(t.inactive)),
        Span::styled(app.health.message.as_str(), Style::default().fg(color)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

fn focus_styles(app: &App, field: Field) -> (Style, Style) {
    let t = &app.theme;
    if app.field == field && app.popup == Popup::None {
        (
            Style::default().fg(t.accent),
            Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
        )
    } else {
        (Style::default().fg(t.inactive), Style::default().fg(t.inactive))
    }
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let (border, title) = focus_styles(app, Field::Markdown);

    let block = Block::default()
        .title(Span::styled(" Markdown ", title))
        .borders(Borders::ALL)
        .border_style(border);

    if app.markdown.is_empty() && app.field != Field::Markdown {
        let hint = Paragraph::new("Paste or type Markdown here")
            .style(Style::default().fg(t.text_dim))
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let mut text = app.markdown.clone();
    if app.field == Field::Markdown {
        text.push('█');
    }

    // Keep the cursor line in view
    let inner_height = area.height.saturating_sub(2);
    let scroll = tail_scroll(&text, inner_height);

    let editor = Paragraph::new(text)
        .style(Style::default().fg(t.text))
        .block(block)
        .scroll((scroll, 0));

    f.render_widget(editor, area);
}

fn draw_form_row(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24)])
        .split(area);

    let (border, title) = focus_styles(app, Field::Filename);
    let cursor = if app.field == Field::Filename { "_" } else { "" };
    let filename = if app.filename.is_empty() && app.field != Field::Filename {
        Span::styled("document.pdf", Style::default().fg(t.text_dim))
    } else {
        Span::styled(format!("{}{}", app.filename, cursor), Style::default().fg(t.text))
    };

    let filename_input = Paragraph::new(Line::from(filename)).block(
        Block::default()
            .title(Span::styled(" Filename ", title))
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(filename_input, chunks[0]);

    // Busy label replaces the idle one while a conversion is in flight
    let (label, color) = if app.converting {
        ("⏳ Converting...", t.warning)
    } else {
        ("Convert to PDF (^S)", t.success)
    };
    let button = Paragraph::new(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if app.converting { t.inactive } else { color })),
    );
    f.render_widget(button, chunks[1]);
}

fn draw_messages(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Status ", Style::default().fg(t.inactive)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(t.inactive));

    let messages = app.messages.messages();
    let skip = messages.len().saturating_sub(MAX_VISIBLE_MESSAGES);

    let lines: Vec<Line> = if messages.is_empty() {
        vec![Line::styled("Ready", Style::default().fg(t.text_dim))]
    } else {
        messages
            .iter()
            .skip(skip)
            .map(|m| {
                let color = match m.kind {
                    MessageKind::Info => t.text,
                    MessageKind::Success => t.success,
                    MessageKind::Error => t.danger,
                };
                Line::styled(m.text.as_str(), Style::default().fg(color))
            })
            .collect()
    };

    let content = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(content, area);
}

fn draw_stats_line(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let mut spans = vec![Span::styled(
        format!(" {}", app.stats.text()),
        Style::default().fg(t.text_dim),
    )];
    if let Some(path) = &app.last_saved {
        spans.push(Span::styled(" │ last: ", Style::default().fg(t.inactive)));
        spans.push(Span::styled(
            path.display().to_string(),
            Style::default().fg(t.text_dim),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let hints: &[(&str, &str)] = &[
        ("^S", "Convert"),
        ("Tab", "Field"),
        ("^L", "Clear"),
        ("^R", "Stats"),
        ("F1", "Help"),
        ("^Q", "Quit"),
    ];

    // Fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 3 } else { hints.len() };
    let footer = Paragraph::new(Line::from(key_hints(&hints[..max_hints], t.accent, t.text_dim)))
        .alignment(Alignment::Center);

    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(t.header).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), Style::default().fg(t.accent)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("═══ Editing ═══"),
        entry("Tab", "Switch between Markdown and filename"),
        entry("Paste", "Insert clipboard text into the focused field"),
        entry("Enter", "New line (Markdown) / convert (filename)"),
        Line::from(""),
        section("═══ Actions ═══"),
        entry("Ctrl+S", "Convert to PDF"),
        entry("Ctrl+L", "Clear form and messages"),
        entry("Ctrl+R", "Refresh service stats"),
        entry("Ctrl+Q", "Quit"),
        Line::from(""),
        section("═══ Output ═══"),
        Line::from(vec![
            Span::raw("  PDFs are saved to "),
            Span::styled(
                app.download_dir.display().to_string(),
                Style::default().fg(t.text_dim),
            ),
        ]),
        Line::from("  An empty filename saves as document.pdf"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(t.text_dim)),
            Span::styled("Esc", Style::default().fg(t.accent)),
            Span::styled(" to close", Style::default().fg(t.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" mdpdf Help ", Style::default().fg(t.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}
