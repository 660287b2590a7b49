use unicode_segmentation::UnicodeSegmentation;

/// Editable text with a cursor counted in grapheme clusters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn parts(&self) -> Vec<&str> {
        self.text.graphemes(true).collect()
    }

    /// Replace the whole text and put the cursor at the end.
    pub fn set(&mut self, s: &str) {
        self.text = s.to_string();
        self.cursor = self.text.graphemes(true).count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, s: &str) {
        let parts = self.parts();
        let idx = self.cursor.min(parts.len());
        let mut out = parts[..idx].concat();
        out.push_str(s);
        out.push_str(&parts[idx..].concat());
        self.text = out;
        self.cursor = (idx + s.graphemes(true).count()).min(self.text.graphemes(true).count());
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.insert(ch.encode_utf8(&mut buf));
    }

    fn splice(&mut self, from: usize, to: usize) {
        let mut parts = self.parts();
        parts.drain(from..to);
        self.text = parts.concat();
        self.cursor = from;
    }

    pub fn delete_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let c = self.cursor.min(self.parts().len());
        if c > 0 {
            self.splice(c - 1, c);
        }
    }

    pub fn delete_right(&mut self) {
        let len = self.parts().len();
        let c = self.cursor.min(len);
        if c < len {
            self.splice(c, c + 1);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let len = self.parts().len();
        if self.cursor < len {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.parts().len();
    }

    fn line_start(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1] != "\n" {
            i -= 1;
        }
        i
    }

    fn line_end(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i] != "\n" {
            i += 1;
        }
        i
    }

    fn word_start(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i > 0 && parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        while i > 0 && !parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        i
    }

    fn word_end(&self) -> usize {
        let parts = self.parts();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i].trim().is_empty() {
            i += 1;
        }
        while i < parts.len() && !parts[i].trim().is_empty() {
            i += 1;
        }
        i
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.line_end();
    }

    pub fn move_word_left(&mut self) {
        self.cursor = self.word_start();
    }

    pub fn move_word_right(&mut self) {
        self.cursor = self.word_end();
    }

    pub fn delete_prev_word(&mut self) {
        let start = self.word_start();
        let c = self.cursor.min(self.parts().len());
        self.splice(start, c);
    }

    pub fn kill_to_line_start(&mut self) {
        let start = self.line_start();
        let c = self.cursor.min(self.parts().len());
        self.splice(start, c);
    }

    pub fn kill_to_line_end(&mut self) {
        let c = self.cursor.min(self.parts().len());
        let end = self.line_end();
        self.splice(c, end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &str) -> InputBuffer {
        let mut b = InputBuffer::default();
        b.set(s);
        b
    }

    #[test]
    fn insert_in_middle_counts_graphemes() {
        let mut b = buf("héllo");
        b.move_home();
        b.move_right();
        b.insert("👍🏽");
        assert_eq!(b.as_str(), "h👍🏽éllo");
        assert_eq!(b.cursor(), 2);
    }

    #[test]
    fn delete_both_directions() {
        let mut b = buf("abc");
        b.delete_left();
        assert_eq!(b.as_str(), "ab");
        b.move_home();
        b.delete_right();
        assert_eq!(b.as_str(), "b");
        b.delete_left();
        assert_eq!(b.as_str(), "b");
    }

    #[test]
    fn word_motions_and_kill() {
        let mut b = buf("one two  three");
        b.delete_prev_word();
        assert_eq!(b.as_str(), "one two  ");
        b.move_word_left();
        assert_eq!(b.cursor(), 4);
        b.move_word_right();
        assert_eq!(b.cursor(), 7);
    }

    #[test]
    fn line_kills_stop_at_newlines() {
        let mut b = buf("first\nsecond line\nthird");
        // cursor into the middle of the second line
        b.move_home();
        for _ in 0..(6 + 6) {
            b.move_right();
        }
        b.kill_to_line_end();
        assert_eq!(b.as_str(), "first\nsecond\nthird");
        b.kill_to_line_start();
        assert_eq!(b.as_str(), "first\n\nthird");
        assert_eq!(b.cursor(), 6);
    }
}
