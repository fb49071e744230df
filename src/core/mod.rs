pub mod filter_state;
pub mod log_line;
pub mod log_state;
pub mod notification;
pub mod stats;

pub use log_line::LogLine;
pub use log_state::{LogRender, LogView, RefreshPhase, RenderedEntry};
pub use notification::{Notification, NotificationKind};
