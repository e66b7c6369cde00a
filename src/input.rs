/// Single-line text entry used while the app is in input mode.
///
/// The cursor is a char index, so multi-byte input never splits a code point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    value: String,
    cursor: usize,
    char_limit: usize,
    pub placeholder: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdit {
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

pub const CHAR_LIMIT: usize = 156;

impl Default for InputField {
    fn default() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            char_limit: CHAR_LIMIT,
            placeholder: "john@email.com",
        }
    }
}

impl InputField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Take the current value, leaving the field empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn insert(&mut self, c: char) {
        if c.is_control() || self.value.chars().count() >= self.char_limit {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn apply(&mut self, edit: InputEdit) {
        let len = self.value.chars().count();
        match edit {
            InputEdit::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            InputEdit::Delete => {
                if self.cursor < len {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            InputEdit::Left => self.cursor = self.cursor.saturating_sub(1),
            InputEdit::Right => self.cursor = (self.cursor + 1).min(len),
            InputEdit::Home => self.cursor = 0,
            InputEdit::End => self.cursor = len,
        }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}
