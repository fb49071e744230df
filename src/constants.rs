pub const LINE_NUMBER_WIDTH: usize = 9;

pub const POLL_INTERVAL_MS: u64 = 50;
pub const REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TAIL_LINES: usize = 50;
pub const NOTIFICATION_TTL_SECS: u64 = 3;

pub const INPUT_FIELD_HEIGHT: u16 = 3;
pub const STATS_PANEL_HEIGHT: u16 = 3;
pub const STATUS_BAR_HEIGHT: u16 = 1;

pub const HELP_POPUP_WIDTH: u16 = 46;
pub const HELP_POPUP_HEIGHT: u16 = 5;

pub const NO_MATCH_PLACEHOLDER: &str = "No logs match the current filters.";
pub const EXPORT_PREFIX: &str = "bot-logs-";
