use crate::app::App;
use crate::constants::{
    HELP_POPUP_HEIGHT, HELP_POPUP_WIDTH, INPUT_FIELD_HEIGHT, LINE_NUMBER_WIDTH,
    STATS_PANEL_HEIGHT, STATUS_BAR_HEIGHT,
};
use crate::core::{LogRender, NotificationKind, RefreshPhase, RenderedEntry};
use crate::highlight::{segment_style, severity_marker, severity_style};
use crate::input::{InputMode, TextInput};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn draw(frame: &mut Frame, app: &App) {
    let stats_height = if app.show_stats { STATS_PANEL_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(INPUT_FIELD_HEIGHT),
            Constraint::Length(stats_height),
            Constraint::Min(1),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(frame.area());

    let inputs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Min(10),
            Constraint::Length(22),
        ])
        .split(chunks[0]);

    draw_level_selector(frame, app, inputs[0]);
    draw_text_input(
        frame,
        &app.input_fields.search,
        inputs[1],
        " Search (/) ",
        app.input_mode == InputMode::SearchEdit,
    );
    draw_text_input(
        frame,
        &app.input_fields.date,
        inputs[2],
        " Date (d) ",
        app.input_mode == InputMode::DateEdit,
    );
    if app.show_stats {
        draw_statistics(frame, app, chunks[1]);
    }
    draw_log_view(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    if app.input_mode != InputMode::Normal {
        draw_help_popup(frame);
    }
}

fn draw_level_selector(frame: &mut Frame, app: &App, area: Rect) {
    let level = app.log_view.criteria().level;
    let widget = Paragraph::new(Span::styled(
        level.to_string(),
        severity_style(Some(level)).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).title(" Level (l) "));
    frame.render_widget(widget, area);
}

fn draw_text_input(frame: &mut Frame, input: &TextInput, area: Rect, label: &str, is_active: bool) {
    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let title = match &input.error {
        Some(err) => format!(" {} (Error: {}) ", label.trim(), err),
        None => label.to_string(),
    };

    let border_style = if input.has_error() {
        Style::default().fg(Color::Red)
    } else {
        style
    };

    let widget = Paragraph::new(input.text.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .style(style);
    frame.render_widget(widget, area);

    if is_active {
        frame.set_cursor_position((area.x + input.cursor as u16 + 1, area.y + 1));
    }
}

fn draw_statistics(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.log_view.statistics();
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled("INFO ", label),
        Span::styled(stats.info.to_string(), value.fg(Color::Cyan)),
        Span::styled("   WARNING ", label),
        Span::styled(stats.warning.to_string(), value.fg(Color::Yellow)),
        Span::styled("   ERROR ", label),
        Span::styled(stats.error.to_string(), value.fg(Color::Red)),
        Span::styled("   Orders ", label),
        Span::styled(stats.total_orders().to_string(), value),
        Span::styled("   Success ", label),
        Span::styled(stats.success_rate_label(), value.fg(Color::Green)),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Statistics (i) ")
            .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(widget, area);
}

fn draw_log_view(frame: &mut Frame, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let view = &app.log_view;

    let title = format!(
        " Logs [{}/{}] {}{}{}",
        view.filtered_len(),
        view.lines().len(),
        if view.criteria().is_unrestricted() {
            ""
        } else {
            "[FILTERED]"
        },
        if view.follow_tail() { "[FOLLOW]" } else { "" },
        if view.phase() == RefreshPhase::Refreshing {
            "[REFRESHING] "
        } else {
            " "
        }
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));

    match view.render() {
        LogRender::Placeholder(text) => {
            let para = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))),
            ])
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(para, area);
        }
        LogRender::Entries { entries, scroll_to } => {
            let first = (scroll_to + 1).saturating_sub(inner_height);
            let lines: Vec<Line> = entries[first..=scroll_to]
                .iter()
                .map(entry_line)
                .collect();
            frame.render_widget(Paragraph::new(lines).block(block), area);
        }
    }
}

fn entry_line(entry: &RenderedEntry) -> Line<'static> {
    let base = severity_style(entry.severity);
    let (marker, marker_style) = severity_marker(entry.severity);

    let mut spans = vec![
        Span::styled(marker, marker_style),
        Span::styled(
            format!("{:>width$} │ ", entry.line_number, width = LINE_NUMBER_WIDTH - 3),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    spans.extend(
        entry
            .segments
            .iter()
            .map(|seg| Span::styled(seg.text.clone(), segment_style(base, seg.highlighted))),
    );
    Line::from(spans)
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (status, style) = match &app.notification {
        Some(note) => {
            let bg = match note.kind {
                NotificationKind::Success => Color::Green,
                NotificationKind::Error => Color::Red,
                NotificationKind::Info => Color::Blue,
            };
            (
                note.message.clone(),
                Style::default().fg(Color::White).bg(bg),
            )
        }
        None => {
            let last_update = match app.log_view.last_update_time {
                Some(time) => format!(" | Updated {}", time.format("%H:%M:%S")),
                None => String::new(),
            };
            (
                format!(
                    "q:Quit l:Level /:Search d:Date r:Refresh c:Clear e:Export i:Stats | {}{}",
                    app.source_label, last_update
                ),
                Style::default().fg(Color::White).bg(Color::Blue),
            )
        }
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn draw_help_popup(frame: &mut Frame) {
    let area = frame.area();
    let popup_area = Rect {
        x: area.width.saturating_sub(HELP_POPUP_WIDTH).max(area.x),
        y: area.height.saturating_sub(HELP_POPUP_HEIGHT + STATUS_BAR_HEIGHT),
        width: HELP_POPUP_WIDTH.min(area.width),
        height: HELP_POPUP_HEIGHT.min(area.height),
    };

    let help_text = vec![
        Line::from("Enter: Apply | Esc: Cancel | ←→: Move cursor"),
        Line::from("Search: case-insensitive regex"),
        Line::from("Date: YYYY-MM-DD, empty to clear"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::source::SourceEvent;
    use crate::state::AppState;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::mpsc;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app_with(lines: &[&str]) -> App {
        let (tx, rx) = mpsc::channel();
        let mut app = App::new(
            rx,
            None,
            AppState::default(),
            AppOptions {
                source_label: "http://bot/logs".to_string(),
                state_path: None,
                export_dir: std::env::temp_dir(),
            },
        );
        tx.send(SourceEvent::Fetched(Ok(lines.iter().map(|s| s.to_string()).collect())))
            .unwrap();
        app.poll_source();
        app.notification = None;
        app
    }

    #[test]
    fn test_empty_view_draws_placeholder() {
        let app = app_with(&[]);
        assert!(screen(&app).contains("No logs match the current filters."));
    }

    #[test]
    fn test_draws_lines_and_statistics() {
        let app = app_with(&["INFO Order successful", "ERROR Order failed"]);
        let text = screen(&app);
        assert!(text.contains("INFO Order successful"));
        assert!(text.contains("ERROR Order failed"));
        assert!(text.contains("50.0%"));
        assert!(text.contains("Logs [2/2]"));
    }

    #[test]
    fn test_hidden_statistics_panel() {
        let mut app = app_with(&["INFO Order successful"]);
        app.show_stats = false;
        assert!(!screen(&app).contains("Statistics"));
    }

    #[test]
    fn test_view_keeps_newest_line_visible() {
        let lines: Vec<String> = (1..=40).map(|i| format!("INFO line {i:02}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let app = app_with(&refs);
        let text = screen(&app);
        assert!(text.contains("INFO line 40"));
        assert!(!text.contains("INFO line 01"));
    }
}
