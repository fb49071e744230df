use crate::filter::FilterCriteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    SearchEdit,
    DateEdit,
}

/// Single-line editable text with a char-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
    pub error: Option<String>,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            text,
            cursor,
            error: None,
        }
    }

    /// Replace the contents, e.g. when an edit is cancelled.
    pub fn reset(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.byte_index(self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_idx = self.byte_index(self.cursor);
        self.text.remove(byte_idx);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_idx = self.byte_index(self.cursor);
            self.text.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

/// The two free-text filter fields. The level is a selector and has no
/// text field.
#[derive(Debug, Clone, Default)]
pub struct InputFields {
    pub search: TextInput,
    pub date: TextInput,
}

impl InputFields {
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            search: TextInput::new(criteria.search.clone()),
            date: TextInput::new(criteria.date.clone().unwrap_or_default()),
        }
    }

    pub fn get_active_mut(&mut self, mode: InputMode) -> Option<&mut TextInput> {
        match mode {
            InputMode::SearchEdit => Some(&mut self.search),
            InputMode::DateEdit => Some(&mut self.date),
            InputMode::Normal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_in_middle_with_multibyte() {
        let mut input = TextInput::new("€x");
        input.move_left();
        input.insert_char('1');
        assert_eq!(input.text, "€1x");
        assert_eq!(input.cursor, 2);
        input.backspace();
        input.backspace();
        assert_eq!(input.text, "x");
        assert_eq!(input.cursor, 0);
        input.delete();
        assert_eq!(input.text, "");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut input = TextInput::new("ab");
        input.move_right();
        assert_eq!(input.cursor, 2);
        input.move_home();
        input.move_left();
        assert_eq!(input.cursor, 0);
        input.backspace();
        assert_eq!(input.text, "ab");
    }

    #[test]
    fn test_from_criteria() {
        let fields = InputFields::from_criteria(&FilterCriteria {
            search: "btc".to_string(),
            date: Some("2024-01-01".to_string()),
            ..FilterCriteria::default()
        });
        assert_eq!(fields.search.text, "btc");
        assert_eq!(fields.date.text, "2024-01-01");
        assert_eq!(fields.date.cursor, 10);
    }
}
