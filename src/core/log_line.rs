use crate::filter::Level;
use regex::Regex;
use std::sync::LazyLock;

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("static date pattern"));

pub const ORDER_SUCCESS_MARKER: &str = "Order successful";
pub const ORDER_FAILURE_MARKER: &str = "Order failed";

/// One raw line as emitted by the bot. The text is never decomposed; every
/// classification is derived from it through [`parse_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub content: String,
}

impl LogLine {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn tags(&self) -> LineTags<'_> {
        parse_line(&self.content)
    }
}

/// What substring matching can tell about a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineTags<'a> {
    pub has_info: bool,
    pub has_warning: bool,
    pub has_error: bool,
    /// First `YYYY-MM-DD` looking token, not validated as a calendar date.
    pub date: Option<&'a str>,
    pub order_successful: bool,
    pub order_failed: bool,
}

impl LineTags<'_> {
    pub fn contains_level(&self, level: Level) -> bool {
        match level {
            Level::All => true,
            Level::Info => self.has_info,
            Level::Warning => self.has_warning,
            Level::Error => self.has_error,
        }
    }

    /// Display severity; ERROR wins over WARNING wins over INFO.
    pub fn severity(&self) -> Option<Level> {
        if self.has_error {
            Some(Level::Error)
        } else if self.has_warning {
            Some(Level::Warning)
        } else if self.has_info {
            Some(Level::Info)
        } else {
            None
        }
    }
}

/// Classify a free-text log line by substring containment.
///
/// Never fails: a line with no recognisable marker yields all-false tags and
/// no date. Level tokens are case-sensitive, matching how the bot prints them.
pub fn parse_line(text: &str) -> LineTags<'_> {
    LineTags {
        has_info: text.contains(Level::Info.token()),
        has_warning: text.contains(Level::Warning.token()),
        has_error: text.contains(Level::Error.token()),
        date: DATE_TOKEN.find(text).map(|m| m.as_str()),
        order_successful: text.contains(ORDER_SUCCESS_MARKER),
        order_failed: text.contains(ORDER_FAILURE_MARKER),
    }
}
