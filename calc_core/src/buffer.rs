//! Expression buffer with a char-indexed cursor

use crate::key::Operator;

/// Single-line editable text with an insertion point
///
/// The cursor counts characters, not bytes, so multi-byte operator symbols
/// (`×`, `÷`) move it by one. `0 <= cursor <= len()` holds after every call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExprBuffer {
    text: String,
    cursor: usize,
}

impl ExprBuffer {
    /// Creates a buffer with the cursor at the end
    pub fn new(text: &str) -> Self {
        let mut buffer = Self::default();
        buffer.set(text);
        buffer
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the content and moves the cursor to the end
    pub fn set(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.cursor = self.len();
    }

    /// Empties the buffer, returning whether anything was removed
    pub fn clear(&mut self) -> bool {
        let had_text = !self.text.is_empty();
        self.text.clear();
        self.cursor = 0;
        had_text
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor < self.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Splices `text` in at the cursor and advances past it
    pub fn insert(&mut self, text: &str) {
        let at = self.byte_index(self.cursor);
        self.text.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    /// Removes the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
        true
    }

    pub fn char_before_cursor(&self) -> Option<char> {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.text.chars().nth(idx))
    }

    /// Applies keypad text using calculator entry rules
    ///
    /// - a second `.` in the same number is dropped
    /// - a lone `.` after a non-digit becomes `0.`
    /// - digits typed over a bare `"0"` replace it (`00` is dropped)
    /// - a binary operator replaces the operator(s) just before the cursor;
    ///   `-` is kept after another operator as a unary minus
    /// - other operators are dropped at the start of text or after `(`
    /// - `)` is dropped when there is no unmatched `(`
    pub fn type_text(&mut self, text: &str) -> bool {
        let Some(first) = text.chars().next() else {
            return false;
        };

        if first == '.' {
            if self.segment_has_decimal() {
                return false;
            }
            if !self.char_before_cursor().is_some_and(|c| c.is_ascii_digit()) {
                self.insert("0.");
                return true;
            }
        }

        if self.text == "0" && (first.is_ascii_digit() || first == '(') {
            if text == "00" {
                return false;
            }
            self.set(text);
            return true;
        }

        if first == ')' && self.unmatched_parens() == 0 {
            return false;
        }

        if Operator::is_operator_char(first) {
            if first == '-' {
                if self.char_before_cursor() == Some('-') {
                    return false;
                }
            } else if self.text.is_empty() {
                self.set("0");
            } else {
                let replaced = self.operators_before_cursor();
                let start = self.cursor - replaced;
                if start == 0 || self.text.chars().nth(start - 1) == Some('(') {
                    return false;
                }
                for _ in 0..replaced {
                    self.backspace();
                }
            }
        }

        self.insert(text);
        true
    }

    /// Length of the operator run that ends at the cursor
    fn operators_before_cursor(&self) -> usize {
        let chars: Vec<char> = self.text.chars().collect();
        chars[..self.cursor]
            .iter()
            .rev()
            .take_while(|c| Operator::is_operator_char(**c))
            .count()
    }

    /// True if the number under the cursor already has a decimal point
    pub fn segment_has_decimal(&self) -> bool {
        let chars: Vec<char> = self.text.chars().collect();
        let is_num = |c: &char| c.is_ascii_digit() || *c == '.';
        let left = chars[..self.cursor].iter().rev().take_while(|c| is_num(c));
        let right = chars[self.cursor..].iter().take_while(|c| is_num(c));
        left.chain(right).any(|c| *c == '.')
    }

    /// Count of `(` not yet closed
    pub fn unmatched_parens(&self) -> usize {
        let open = self.text.chars().filter(|c| *c == '(').count();
        let close = self.text.chars().filter(|c| *c == ')').count();
        open.saturating_sub(close)
    }

    /// Char index where the trailing number literal starts
    ///
    /// A `-` directly before the digits is included when it is a unary
    /// minus (start of text, or after an operator or `(`).
    pub fn trailing_number_start(&self) -> Option<usize> {
        let chars: Vec<char> = self.text.chars().collect();
        let digits = chars
            .iter()
            .rev()
            .take_while(|c| c.is_ascii_digit() || **c == '.')
            .count();
        if digits == 0 {
            return None;
        }
        let start = chars.len() - digits;
        if start > 0 && chars[start - 1] == '-' {
            let unary = start == 1
                || Operator::is_operator_char(chars[start - 2])
                || chars[start - 2] == '(';
            if unary {
                return Some(start - 1);
            }
        }
        Some(start)
    }

    /// Splits into (prefix, trailing number)
    pub fn split_trailing_number(&self) -> (String, String) {
        match self.trailing_number_start() {
            Some(start) => {
                let at = self.byte_index(start);
                (self.text[..at].to_string(), self.text[at..].to_string())
            }
            None => (self.text.clone(), String::new()),
        }
    }

    /// Replaces everything from char `start` to the end, cursor to end
    pub fn replace_tail(&mut self, start: usize, replacement: &str) {
        let at = self.byte_index(start.min(self.len()));
        self.text.truncate(at);
        self.text.push_str(replacement);
        self.cursor = self.len();
    }

    /// Adds or removes a leading `-`, keeping the cursor on the same char
    pub fn toggle_leading_minus(&mut self) {
        if self.text.starts_with('-') {
            self.text.remove(0);
            self.cursor = self.cursor.saturating_sub(1);
        } else {
            self.text.insert(0, '-');
            self.cursor += 1;
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut buffer = ExprBuffer::new("2");
        buffer.insert("×");
        buffer.insert("3");
        assert_eq!(buffer.as_str(), "2×3");
        assert_eq!(buffer.cursor(), 3);

        buffer.move_left();
        assert!(buffer.backspace());
        assert_eq!(buffer.as_str(), "23");
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn test_cursor_clamped() {
        let mut buffer = ExprBuffer::new("12");
        assert!(!buffer.move_right());
        buffer.move_left();
        buffer.move_left();
        assert!(!buffer.move_left());
        assert_eq!(buffer.cursor(), 0);
        assert!(!buffer.backspace());
    }

    #[test]
    fn test_type_text_replaces_zero() {
        let mut buffer = ExprBuffer::new("0");
        assert!(buffer.type_text("7"));
        assert_eq!(buffer.as_str(), "7");

        let mut buffer = ExprBuffer::new("0");
        assert!(!buffer.type_text("00"));
        assert_eq!(buffer.as_str(), "0");
    }

    #[test]
    fn test_decimal_guard() {
        let mut buffer = ExprBuffer::new("1.5");
        assert!(!buffer.type_text("."));
        buffer.type_text("+");
        assert!(buffer.type_text("."));
        assert_eq!(buffer.as_str(), "1.5+0.");
    }

    #[test]
    fn test_operator_replaces_operator() {
        let mut buffer = ExprBuffer::new("5+");
        buffer.type_text("×");
        assert_eq!(buffer.as_str(), "5×");
        buffer.type_text("-");
        assert_eq!(buffer.as_str(), "5×-");
        assert!(!buffer.type_text("-"));
        buffer.type_text("+");
        assert_eq!(buffer.as_str(), "5+");
    }

    #[test]
    fn test_operator_after_open_paren_leaves_buffer() {
        let mut buffer = ExprBuffer::new("(");
        assert!(buffer.type_text("-"));
        assert!(!buffer.type_text("×"));
        assert_eq!(buffer.as_str(), "(-");
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn test_operator_never_lands_at_start() {
        let mut buffer = ExprBuffer::new("-5");
        buffer.move_left();
        assert!(!buffer.type_text("×"));
        assert_eq!(buffer.as_str(), "-5");
        assert_eq!(buffer.cursor(), 1);

        let mut buffer = ExprBuffer::new("5");
        buffer.move_left();
        assert!(!buffer.type_text("+"));
        assert_eq!(buffer.as_str(), "5");
    }

    #[test]
    fn test_operator_into_empty_field_starts_from_zero() {
        let mut buffer = ExprBuffer::new("");
        assert!(buffer.type_text("×"));
        assert_eq!(buffer.as_str(), "0×");
    }

    #[test]
    fn test_close_paren_requires_open() {
        let mut buffer = ExprBuffer::new("2");
        assert!(!buffer.type_text(")"));
        buffer.type_text("(");
        buffer.type_text("3");
        assert!(buffer.type_text(")"));
        assert_eq!(buffer.unmatched_parens(), 0);
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(ExprBuffer::new("12+34").trailing_number_start(), Some(3));
        assert_eq!(ExprBuffer::new("-5").trailing_number_start(), Some(0));
        assert_eq!(ExprBuffer::new("3×-5").trailing_number_start(), Some(2));
        assert_eq!(ExprBuffer::new("3-5").trailing_number_start(), Some(2));
        assert_eq!(ExprBuffer::new("3+").trailing_number_start(), None);

        let (prefix, number) = ExprBuffer::new("7÷12").split_trailing_number();
        assert_eq!(prefix, "7÷");
        assert_eq!(number, "12");
    }

    #[test]
    fn test_toggle_leading_minus() {
        let mut buffer = ExprBuffer::new("42");
        buffer.toggle_leading_minus();
        assert_eq!(buffer.as_str(), "-42");
        assert_eq!(buffer.cursor(), 3);
        buffer.toggle_leading_minus();
        assert_eq!(buffer.as_str(), "42");
        assert_eq!(buffer.cursor(), 2);
    }
}
