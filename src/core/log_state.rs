use super::filter_state::FilterState;
use super::log_line::LogLine;
use super::notification::Notification;
use super::stats::{compute_statistics, Statistics};
use crate::constants::NO_MATCH_PLACEHOLDER;
use crate::filter::{FilterCriteria, FilterError, Level};
use crate::highlight::{highlight_line, Segment};
use crate::source::FetchError;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    /// 1-based position in the master sequence.
    pub line_number: usize,
    pub severity: Option<Level>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRender {
    Placeholder(&'static str),
    Entries {
        entries: Vec<RenderedEntry>,
        /// Index into `entries` that should sit at the bottom of the view.
        scroll_to: usize,
    },
}

/// Master and filtered log sequences with their derived statistics.
///
/// The filtered sequence is kept as strictly increasing indices into the
/// master sequence and is rebuilt from scratch on every filter or reload.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    lines: Vec<LogLine>,
    filtered_indices: Vec<usize>,
    filter: FilterState,
    stats: Statistics,
    phase: RefreshPhase,
    bottom_line_idx: usize,
    follow_tail: bool,
    pub last_update_time: Option<DateTime<Local>>,
}

impl LogView {
    pub fn new() -> Self {
        Self {
            follow_tail: true,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    #[cfg(test)]
    pub fn filtered_lines(&self) -> impl Iterator<Item = &LogLine> + '_ {
        self.filtered_indices.iter().map(|&i| &self.lines[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered_indices.len()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.filter.criteria
    }

    pub fn filter_error(&self) -> Option<&FilterError> {
        self.filter.error()
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn follow_tail(&self) -> bool {
        self.follow_tail
    }

    /// Replace the master sequence. The filtered view shows everything until
    /// a filter is applied. A user who scrolled away keeps their position.
    pub fn load<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(LogLine::new).collect();
        self.filtered_indices = (0..self.lines.len()).collect();
        self.last_update_time = Some(Local::now());
        self.keep_scroll_in_range();
    }

    pub fn update_statistics(&mut self) -> Statistics {
        self.stats = compute_statistics(&self.lines);
        self.stats
    }

    /// Re-derive the filtered sequence from the master sequence.
    ///
    /// An invalid search pattern leaves the view empty and hands the compile
    /// error back for display; it is never raised further.
    pub fn apply_filter(&mut self, criteria: FilterCriteria) -> Result<usize, FilterError> {
        self.filter = FilterState::new(criteria);
        let result = self.reapply_filter();
        self.scroll_to_end();
        result
    }

    /// Rebuild with the last applied criteria, keeping the scroll position.
    pub fn reapply_filter(&mut self) -> Result<usize, FilterError> {
        let filter = &self.filter;
        self.filtered_indices = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| filter.matches(line))
            .map(|(i, _)| i)
            .collect();
        self.keep_scroll_in_range();
        debug!(
            matched = self.filtered_indices.len(),
            total = self.lines.len(),
            "filter applied"
        );
        match self.filter.error() {
            Some(err) => Err(err.clone()),
            None => Ok(self.filtered_indices.len()),
        }
    }

    pub fn render(&self) -> LogRender {
        if self.filtered_indices.is_empty() {
            return LogRender::Placeholder(NO_MATCH_PLACEHOLDER);
        }
        let entries = self
            .filtered_indices
            .iter()
            .map(|&i| {
                let line = &self.lines[i];
                RenderedEntry {
                    line_number: i + 1,
                    severity: line.tags().severity(),
                    segments: highlight_line(&line.content, &self.filter.pattern),
                }
            })
            .collect();
        LogRender::Entries {
            entries,
            scroll_to: self.get_bottom_line_idx(),
        }
    }

    /// Idle -> Refreshing. Returns false when a refresh is already in flight.
    pub fn begin_refresh(&mut self) -> bool {
        if self.phase == RefreshPhase::Refreshing {
            return false;
        }
        self.phase = RefreshPhase::Refreshing;
        true
    }

    /// Settle a refresh. A failure leaves every sequence and counter as it
    /// was before the refresh started.
    pub fn complete_refresh(&mut self, result: Result<Vec<String>, FetchError>) -> Notification {
        self.phase = RefreshPhase::Idle;
        match result {
            Ok(lines) => {
                info!(count = lines.len(), "logs refreshed");
                self.load(lines);
                self.update_statistics();
                // A bad pattern was already reported when it was entered.
                let _ = self.reapply_filter();
                Notification::success("Logs refreshed successfully")
            }
            Err(e) => {
                warn!(error = %e, "log refresh failed");
                Notification::error(format!("Failed to refresh logs: {}", e))
            }
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.filtered_indices.clear();
        self.update_statistics();
        self.bottom_line_idx = 0;
        self.follow_tail = true;
    }

    pub fn scroll_up(&mut self, amount: usize) {
        if self.follow_tail {
            self.bottom_line_idx = self.filtered_indices.len().saturating_sub(1);
        }
        self.bottom_line_idx = self.bottom_line_idx.saturating_sub(amount);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, amount: usize) {
        let max_idx = self.filtered_indices.len().saturating_sub(1);
        if self.follow_tail {
            return;
        }
        self.bottom_line_idx = (self.bottom_line_idx + amount).min(max_idx);
        if self.bottom_line_idx >= max_idx {
            self.follow_tail = true;
        }
    }

    pub fn scroll_to_start(&mut self) {
        self.bottom_line_idx = 0;
        self.follow_tail = false;
    }

    pub fn scroll_to_end(&mut self) {
        self.follow_tail = true;
        self.bottom_line_idx = self.filtered_indices.len().saturating_sub(1);
    }

    fn keep_scroll_in_range(&mut self) {
        let max_idx = self.filtered_indices.len().saturating_sub(1);
        self.bottom_line_idx = if self.follow_tail {
            max_idx
        } else {
            self.bottom_line_idx.min(max_idx)
        };
    }

    pub fn get_bottom_line_idx(&self) -> usize {
        if self.follow_tail {
            self.filtered_indices.len().saturating_sub(1)
        } else {
            self.bottom_line_idx
                .min(self.filtered_indices.len().saturating_sub(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    const SAMPLE: [&str; 6] = [
        "2024-03-01 09:00:00 INFO Bot started",
        "2024-03-01 09:00:05 INFO Order successful: BTCUSDT BUY 0.01",
        "2024-03-01 09:01:00 WARNING Slow response from exchange",
        "2024-03-02 10:00:00 ERROR Order failed: insufficient balance",
        "connection pool warmed up",
        "2024-03-02 10:05:00 INFO Order successful: ETHUSDT SELL 0.5",
    ];

    fn loaded() -> LogView {
        let mut view = LogView::new();
        view.load(SAMPLE);
        view.update_statistics();
        view
    }

    fn criteria(level: Level, search: &str, date: Option<&str>) -> FilterCriteria {
        FilterCriteria {
            level,
            search: search.to_string(),
            date: date.map(str::to_string),
        }
    }

    fn filtered(view: &LogView) -> Vec<String> {
        view.filtered_lines().map(|l| l.content.clone()).collect()
    }

    #[test]
    fn test_load_resets_filtered_to_master() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::Error, "", None)).unwrap();
        view.load(["INFO a", "INFO b"]);
        assert_eq!(filtered(&view), vec!["INFO a", "INFO b"]);
    }

    #[test]
    fn test_load_empty() {
        let mut view = LogView::new();
        view.load(Vec::<String>::new());
        assert!(view.lines().is_empty());
        assert_eq!(view.render(), LogRender::Placeholder(NO_MATCH_PLACEHOLDER));
    }

    #[test]
    fn test_unrestricted_filter_is_identity() {
        let mut view = loaded();
        let n = view.apply_filter(FilterCriteria::default()).unwrap();
        assert_eq!(n, SAMPLE.len());
        assert_eq!(filtered(&view), SAMPLE);
    }

    #[test]
    fn test_level_filter_partitions_master() {
        for level in [Level::Info, Level::Warning, Level::Error] {
            let mut view = loaded();
            view.apply_filter(criteria(level, "", None)).unwrap();
            let kept = filtered(&view);
            for line in SAMPLE {
                let has = line.contains(level.token());
                assert_eq!(kept.iter().any(|k| k == line), has, "{level} / {line}");
            }
        }
    }

    #[test]
    fn test_filters_do_not_compose() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::Error, "", None)).unwrap();
        view.apply_filter(criteria(Level::Info, "", None)).unwrap();
        assert_eq!(filtered(&view).len(), 3);
    }

    #[test]
    fn test_apply_filter_idempotent() {
        let mut view = loaded();
        let c = criteria(Level::Info, "order", Some("2024-03-02"));
        view.apply_filter(c.clone()).unwrap();
        let once = filtered(&view);
        view.apply_filter(c).unwrap();
        assert_eq!(filtered(&view), once);
        assert_eq!(once, vec![SAMPLE[5]]);
    }

    #[test]
    fn test_date_filter_excludes_undated() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::All, "", Some("2024-03-01")))
            .unwrap();
        let kept = filtered(&view);
        assert_eq!(kept.len(), 3);
        assert!(!kept.iter().any(|l| l == "connection pool warmed up"));
    }

    #[test]
    fn test_invalid_pattern_yields_no_match() {
        let mut view = loaded();
        let err = view.apply_filter(criteria(Level::All, "(", None)).unwrap_err();
        assert!(matches!(err, FilterError::InvalidPattern { .. }));
        assert_eq!(view.filtered_len(), 0);
        assert_eq!(view.render(), LogRender::Placeholder(NO_MATCH_PLACEHOLDER));
    }

    #[test]
    fn test_render_placeholder_when_empty() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::All, "no such text", None))
            .unwrap();
        assert_eq!(view.render(), LogRender::Placeholder(NO_MATCH_PLACEHOLDER));
    }

    #[test]
    fn test_render_tags_and_highlights() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::All, "order", None)).unwrap();
        match view.render() {
            LogRender::Entries { entries, scroll_to } => {
                assert_eq!(entries.len(), 3);
                assert_eq!(scroll_to, 2);
                assert_eq!(entries[0].line_number, 2);
                assert_eq!(entries[1].severity, Some(Level::Error));
                assert!(entries
                    .iter()
                    .all(|e| e.segments.iter().any(|s| s.highlighted && s.text == "Order")));
            }
            other => panic!("expected entries, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_success_replaces_and_reapplies() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::Error, "", None)).unwrap();
        assert!(view.begin_refresh());
        let note = view.complete_refresh(Ok(vec![
            "ERROR one".to_string(),
            "INFO two".to_string(),
            "ERROR three".to_string(),
        ]));
        assert_eq!(note.kind, crate::core::NotificationKind::Success);
        assert_eq!(view.phase(), RefreshPhase::Idle);
        assert_eq!(view.lines().len(), 3);
        assert_eq!(filtered(&view), vec!["ERROR one", "ERROR three"]);
        assert_eq!(view.statistics().error, 2);
    }

    #[test]
    fn test_refresh_failure_leaves_state_untouched() {
        let mut view = loaded();
        view.apply_filter(criteria(Level::Info, "", None)).unwrap();
        let lines_before = view.lines().to_vec();
        let filtered_before = filtered(&view);
        let stats_before = view.statistics();

        assert!(view.begin_refresh());
        let note = view.complete_refresh(Err(FetchError::Status(StatusCode::BAD_GATEWAY)));

        assert_eq!(note.kind, crate::core::NotificationKind::Error);
        assert_eq!(view.phase(), RefreshPhase::Idle);
        assert_eq!(view.lines(), lines_before.as_slice());
        assert_eq!(filtered(&view), filtered_before);
        assert_eq!(view.statistics(), stats_before);
    }

    #[test]
    fn test_overlapping_refresh_rejected() {
        let mut view = loaded();
        assert!(view.begin_refresh());
        assert!(!view.begin_refresh());
        view.complete_refresh(Ok(Vec::new()));
        assert!(view.begin_refresh());
    }

    #[test]
    fn test_clear_zeroes_statistics() {
        let mut view = loaded();
        assert_eq!(view.statistics().total_orders(), 3);
        view.clear();
        assert!(view.lines().is_empty());
        assert_eq!(view.statistics(), Statistics::default());
    }

    #[test]
    fn test_scroll_follow_tail() {
        let mut view = loaded();
        assert!(view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), SAMPLE.len() - 1);
        view.scroll_up(2);
        assert!(!view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), SAMPLE.len() - 3);
        view.scroll_down(10);
        assert!(view.follow_tail());
    }

    #[test]
    fn test_refresh_keeps_scrolled_position() {
        let mut view = loaded();
        view.scroll_up(3);
        let bottom = view.get_bottom_line_idx();
        assert!(view.begin_refresh());
        let mut refreshed: Vec<String> = SAMPLE.iter().map(|l| l.to_string()).collect();
        refreshed.push("2024-03-02 10:06:00 INFO heartbeat".to_string());
        view.complete_refresh(Ok(refreshed));
        assert!(!view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), bottom);

        // Shrinking logs clamp the position instead of pointing past the end.
        view.complete_refresh(Ok(vec!["INFO only".to_string()]));
        assert!(!view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), 0);
    }

    #[test]
    fn test_refresh_follows_tail_when_at_bottom() {
        let mut view = loaded();
        assert!(view.begin_refresh());
        let mut refreshed: Vec<String> = SAMPLE.iter().map(|l| l.to_string()).collect();
        refreshed.push("2024-03-02 10:06:00 INFO heartbeat".to_string());
        view.complete_refresh(Ok(refreshed));
        assert!(view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), SAMPLE.len());
    }

    #[test]
    fn test_new_filter_jumps_to_newest() {
        let mut view = loaded();
        view.scroll_to_start();
        view.apply_filter(criteria(Level::Info, "", None)).unwrap();
        assert!(view.follow_tail());
        assert_eq!(view.get_bottom_line_idx(), 2);
    }
}
