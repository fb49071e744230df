use crate::filter::FilterCriteria;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const STATE_FILE: &str = ".botlogs-state";

/// Filter inputs remembered between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default = "default_show_stats")]
    pub show_stats: bool,
}

fn default_show_stats() -> bool {
    true
}

impl AppState {
    pub fn default_path() -> PathBuf {
        PathBuf::from(STATE_FILE)
    }

    /// Missing or unreadable state silently falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring corrupt state file");
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(path, content) {
                    warn!(path = %path.display(), error = %e, "failed to save state");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize state"),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            show_stats: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Level;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("botlogs-state-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = temp_path("roundtrip");
        let state = AppState {
            criteria: FilterCriteria {
                level: Level::Warning,
                search: "binance".to_string(),
                date: Some("2024-05-01".to_string()),
            },
            show_stats: false,
        };
        state.save_to(&path);
        assert_eq!(AppState::load_from(&path), state);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let state = AppState::load_from(&temp_path("missing"));
        assert_eq!(state.criteria, FilterCriteria::default());
        assert!(state.show_stats);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        assert!(AppState::load_from(&path).show_stats);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_level_serialized_as_dashboard_value() {
        let json = serde_json::to_string(&FilterCriteria {
            level: Level::Error,
            ..FilterCriteria::default()
        })
        .unwrap();
        assert!(json.contains(r#""level":"ERROR""#));
    }
}
