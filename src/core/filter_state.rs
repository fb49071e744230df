use super::log_line::LogLine;
use crate::filter::{FilterCriteria, FilterError, SearchPattern};

/// Criteria plus the compiled search pattern, rebuilt whenever the criteria
/// change so every line test reuses the same regex.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub criteria: FilterCriteria,
    pub pattern: SearchPattern,
}

impl FilterState {
    pub fn new(criteria: FilterCriteria) -> Self {
        let pattern = SearchPattern::compile(&criteria.search);
        Self { criteria, pattern }
    }

    pub fn error(&self) -> Option<&FilterError> {
        self.pattern.error()
    }

    /// Level, then search, then date. Lines without an embedded date never
    /// pass an active date filter.
    pub fn matches(&self, line: &LogLine) -> bool {
        let tags = line.tags();
        if !tags.contains_level(self.criteria.level) {
            return false;
        }
        if !self.pattern.is_match(&line.content) {
            return false;
        }
        match &self.criteria.date {
            Some(wanted) => tags.date == Some(wanted.as_str()),
            None => true,
        }
    }
}
