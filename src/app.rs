use crate::core::{LogView, Notification, RefreshPhase};
use crate::export::export_lines;
use crate::filter::{parse_date_input, FilterCriteria};
use crate::input::{InputFields, InputMode};
use crate::source::{SourceEvent, SourceHandle};
use crate::state::AppState;
use chrono::Local;
use crossterm::event::KeyCode;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Instant;
use tracing::info;

pub struct AppOptions {
    pub source_label: String,
    pub state_path: Option<PathBuf>,
    pub export_dir: PathBuf,
}

pub struct App {
    pub log_view: LogView,
    pub input_fields: InputFields,
    pub input_mode: InputMode,
    pub show_stats: bool,
    pub notification: Option<Notification>,
    pub source_label: String,
    source_rx: Receiver<SourceEvent>,
    source: Option<SourceHandle>,
    state_path: Option<PathBuf>,
    export_dir: PathBuf,
}

impl App {
    pub fn new(
        source_rx: Receiver<SourceEvent>,
        source: Option<SourceHandle>,
        state: AppState,
        options: AppOptions,
    ) -> Self {
        let mut app = Self {
            log_view: LogView::new(),
            input_fields: InputFields::from_criteria(&state.criteria),
            input_mode: InputMode::Normal,
            show_stats: state.show_stats,
            notification: None,
            source_label: options.source_label,
            source_rx,
            source,
            state_path: options.state_path,
            export_dir: options.export_dir,
        };
        if let Err(e) = app.log_view.apply_filter(state.criteria) {
            app.input_fields.search.set_error(Some(e.to_string()));
        }
        app
    }

    pub fn poll_source(&mut self) {
        while let Ok(event) = self.source_rx.try_recv() {
            match event {
                SourceEvent::RefreshStarted => {
                    self.log_view.begin_refresh();
                }
                SourceEvent::Fetched(result) => {
                    self.notification = Some(self.log_view.complete_refresh(result));
                }
            }
        }
    }

    pub fn expire_notification(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notification = None;
        }
    }

    /// Returns true when the key asks to apply the active field.
    pub fn handle_input_key(&mut self, key_code: KeyCode) -> bool {
        if key_code == KeyCode::Esc {
            self.cancel_input();
            return false;
        }
        if let Some(input) = self.input_fields.get_active_mut(self.input_mode) {
            match key_code {
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                KeyCode::Home => input.move_home(),
                KeyCode::End => input.move_end(),
                KeyCode::Char(c) => input.insert_char(c),
                KeyCode::Backspace => input.backspace(),
                KeyCode::Delete => input.delete(),
                KeyCode::Enter => return true,
                _ => {}
            }
        }
        false
    }

    pub fn apply_current_input(&mut self) {
        match self.input_mode {
            InputMode::SearchEdit => self.apply_search(),
            InputMode::DateEdit => self.apply_date(),
            InputMode::Normal => {}
        }
    }

    /// Leave edit mode, restoring the field to what is actually applied.
    pub fn cancel_input(&mut self) {
        let criteria = self.log_view.criteria().clone();
        match self.input_mode {
            InputMode::SearchEdit => {
                self.input_fields.search.reset(&criteria.search);
                let error = self.log_view.filter_error().map(|e| e.to_string());
                self.input_fields.search.set_error(error);
            }
            InputMode::DateEdit => {
                self.input_fields
                    .date
                    .reset(criteria.date.as_deref().unwrap_or_default());
                self.input_fields.date.set_error(None);
            }
            InputMode::Normal => {}
        }
        self.input_mode = InputMode::Normal;
    }

    fn apply_search(&mut self) {
        let criteria = FilterCriteria {
            search: self.input_fields.search.text.clone(),
            ..self.log_view.criteria().clone()
        };
        match self.log_view.apply_filter(criteria) {
            Ok(_) => {
                self.input_fields.search.set_error(None);
                self.input_mode = InputMode::Normal;
            }
            Err(e) => self.input_fields.search.set_error(Some(e.to_string())),
        }
        self.save_state();
    }

    fn apply_date(&mut self) {
        let date = match parse_date_input(&self.input_fields.date.text) {
            Ok(date) => date,
            Err(e) => {
                self.input_fields.date.set_error(Some(e.to_string()));
                return;
            }
        };
        self.input_fields.date.set_error(None);
        self.input_mode = InputMode::Normal;
        let criteria = FilterCriteria {
            date,
            ..self.log_view.criteria().clone()
        };
        // A search error is already displayed on the search field.
        let _ = self.log_view.apply_filter(criteria);
        self.save_state();
    }

    pub fn cycle_level(&mut self) {
        let current = self.log_view.criteria().clone();
        let criteria = FilterCriteria {
            level: current.level.next(),
            ..current
        };
        let _ = self.log_view.apply_filter(criteria);
        self.save_state();
    }

    pub fn request_refresh(&mut self) {
        if self.log_view.phase() == RefreshPhase::Refreshing {
            self.notification = Some(Notification::info("Refresh already in progress"));
            return;
        }
        let sent = self
            .source
            .as_ref()
            .is_some_and(|handle| handle.request_refresh());
        if !sent {
            self.notification = Some(Notification::error("Failed to refresh logs: source stopped"));
        }
    }

    pub fn clear(&mut self) {
        self.log_view.clear();
        info!("logs cleared");
        self.notification = Some(Notification::success("Logs cleared successfully."));
    }

    pub fn export(&mut self) {
        let today = Local::now().date_naive();
        self.notification = Some(
            match export_lines(self.log_view.lines(), &self.export_dir, today) {
                Ok(path) => {
                    info!(path = %path.display(), "logs exported");
                    Notification::success(format!("Logs downloaded to {}", path.display()))
                }
                Err(e) => Notification::error(e.to_string()),
            },
        );
    }

    pub fn toggle_stats(&mut self) {
        self.show_stats = !self.show_stats;
        self.save_state();
    }

    fn save_state(&self) {
        if let Some(path) = &self.state_path {
            let state = AppState {
                criteria: self.log_view.criteria().clone(),
                show_stats: self.show_stats,
            };
            state.save_to(path);
        }
    }
}
