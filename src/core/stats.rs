use super::log_line::LogLine;

/// Counters shown in the statistics panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub successful_orders: usize,
    pub failed_orders: usize,
}

impl Statistics {
    pub fn total_orders(&self) -> usize {
        self.successful_orders + self.failed_orders
    }

    /// Percentage rounded to one decimal, `None` when no orders were seen.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total_orders();
        if total == 0 {
            return None;
        }
        let rate = self.successful_orders as f64 / total as f64 * 100.0;
        Some((rate * 10.0).round() / 10.0)
    }

    /// `66.7%`, or `0%` when there were no orders.
    pub fn success_rate_label(&self) -> String {
        match self.success_rate() {
            Some(rate) => format!("{:.1}%", rate),
            None => "0%".to_string(),
        }
    }
}

/// One pass over the lines. Each marker is counted independently, so a line
/// can contribute to several counters.
pub fn compute_statistics(lines: &[LogLine]) -> Statistics {
    lines.iter().fold(Statistics::default(), |mut stats, line| {
        let tags = line.tags();
        stats.info += tags.has_info as usize;
        stats.warning += tags.has_warning as usize;
        stats.error += tags.has_error as usize;
        stats.successful_orders += tags.order_successful as usize;
        stats.failed_orders += tags.order_failed as usize;
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<LogLine> {
        raw.iter().map(|s| LogLine::new(*s)).collect()
    }

    #[test]
    fn test_mixed_lines() {
        let stats = compute_statistics(&lines(&[
            "INFO a",
            "ERROR b",
            "Order successful x",
            "Order failed y",
            "Order successful z",
        ]));
        assert_eq!(stats.info, 1);
        assert_eq!(stats.error, 1);
        assert_eq!(stats.warning, 0);
        assert_eq!(stats.total_orders(), 3);
        assert_eq!(stats.success_rate_label(), "66.7%");
    }

    #[test]
    fn test_no_orders_reports_zero() {
        let stats = compute_statistics(&lines(&["INFO started", "WARNING slow"]));
        assert_eq!(stats.total_orders(), 0);
        assert_eq!(stats.success_rate(), None);
        assert_eq!(stats.success_rate_label(), "0%");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute_statistics(&[]), Statistics::default());
    }

    #[test]
    fn test_whole_percentages_keep_one_decimal() {
        let stats = compute_statistics(&lines(&["Order successful", "Order failed"]));
        assert_eq!(stats.success_rate_label(), "50.0%");
    }
}
