use crate::filter::{Level, SearchPattern};
use ratatui::style::{Color, Modifier, Style};

/// A run of text that is either a search hit or plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }

    fn hit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: true,
        }
    }
}

/// Split `text` around every occurrence of the search pattern. Without an
/// active, valid pattern the whole line is one plain segment.
pub fn highlight_line(text: &str, pattern: &SearchPattern) -> Vec<Segment> {
    let ranges = pattern.find_all(text);
    if ranges.is_empty() {
        return vec![Segment::plain(text)];
    }

    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut pos = 0;
    for (start, end) in ranges {
        if start > pos {
            segments.push(Segment::plain(&text[pos..start]));
        }
        segments.push(Segment::hit(&text[start..end]));
        pos = end;
    }
    if pos < text.len() {
        segments.push(Segment::plain(&text[pos..]));
    }
    segments
}

pub fn severity_style(severity: Option<Level>) -> Style {
    match severity {
        Some(Level::Error) => Style::default().fg(Color::Red),
        Some(Level::Warning) => Style::default().fg(Color::Yellow),
        Some(Level::Info) => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
}

/// Left gutter marker standing in for the coloured border of a log entry.
pub fn severity_marker(severity: Option<Level>) -> (&'static str, Style) {
    match severity {
        Some(_) => ("▌", severity_style(severity).add_modifier(Modifier::BOLD)),
        None => (" ", Style::default()),
    }
}

pub fn segment_style(base: Style, highlighted: bool) -> Style {
    if highlighted {
        Style::default()
            .bg(Color::Yellow)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        base
    }
}
