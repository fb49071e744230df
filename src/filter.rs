use chrono::NaiveDate;
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown level '{0}', expected all, INFO, WARNING or ERROR")]
    UnknownLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

impl Level {
    pub const CYCLE: [Level; 4] = [Level::All, Level::Info, Level::Warning, Level::Error];

    /// The literal marker searched for in a line. `All` has none.
    pub fn token(self) -> &'static str {
        match self {
            Level::All => "",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    pub fn next(self) -> Level {
        let pos = Self::CYCLE.iter().position(|l| *l == self).unwrap_or(0);
        Self::CYCLE[(pos + 1) % Self::CYCLE.len()]
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::All => f.write_str("all"),
            other => f.write_str(other.token()),
        }
    }
}

impl FromStr for Level {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ALL" => Ok(Level::All),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            _ => Err(FilterError::UnknownLevel(s.to_string())),
        }
    }
}

/// The user-facing filter tuple. Compiled into a
/// [`FilterState`](crate::core::filter_state::FilterState) before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub level: Level,
    pub search: String,
    pub date: Option<String>,
}

impl FilterCriteria {
    pub fn is_unrestricted(&self) -> bool {
        self.level == Level::All && self.search.is_empty() && self.date.is_none()
    }
}

/// A search term compiled as a case-insensitive regex.
///
/// Backtracking syntax (lookaround, backreferences) is accepted so terms
/// written for the web dashboard keep working.
#[derive(Debug, Clone, Default)]
pub enum SearchPattern {
    #[default]
    Empty,
    Valid(Regex),
    Invalid(FilterError),
}

impl SearchPattern {
    pub fn compile(term: &str) -> Self {
        if term.is_empty() {
            return SearchPattern::Empty;
        }
        match Regex::new(&format!("(?i){}", term)) {
            Ok(re) => SearchPattern::Valid(re),
            Err(e) => SearchPattern::Invalid(FilterError::InvalidPattern {
                pattern: term.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn error(&self) -> Option<&FilterError> {
        match self {
            SearchPattern::Invalid(e) => Some(e),
            _ => None,
        }
    }

    /// Empty matches everything, an invalid pattern matches nothing. A
    /// runtime failure (backtrack limit) counts as no match for that line.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            SearchPattern::Empty => true,
            SearchPattern::Valid(re) => re.is_match(text).unwrap_or(false),
            SearchPattern::Invalid(_) => false,
        }
    }

    /// Byte ranges of every non-empty occurrence, in order, non-overlapping.
    pub fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        let re = match self {
            SearchPattern::Valid(re) => re,
            _ => return Vec::new(),
        };
        re.find_iter(text)
            .map_while(Result::ok)
            .filter(|m| m.end() > m.start())
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

/// Validate a date field. Blank means "no date filter".
pub fn parse_date_input(input: &str) -> Result<Option<String>, FilterError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let well_formed = input.len() == 10
        && input
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !well_formed || NaiveDate::parse_from_str(input, "%Y-%m-%d").is_err() {
        return Err(FilterError::InvalidDate(input.to_string()));
    }
    Ok(Some(input.to_string()))
}
