//! Model of the editing widget inside the sandbox.
//!
//! Only what synchronization touches is modelled: the text, the cursor and
//! the scroll position. Positions exposed to the outside are 1-based
//! line/column pairs counted in characters.

/// Editing widget state.
#[derive(Debug, Default, Clone)]
pub struct EditorWidget {
    text: String,
    /// Byte offset, always on a char boundary.
    cursor: usize,
    /// First visible line, 0-based.
    scroll_top: usize,
}

impl EditorWidget {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: 0,
            scroll_top: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    /// Replace the content wholesale, keeping cursor and scroll where they
    /// were. Both are clamped when the new text is shorter.
    pub fn replace_preserving(&mut self, text: impl Into<String>) {
        let (cursor, scroll) = (self.cursor, self.scroll_top);
        self.text = text.into();
        self.cursor = clamp_to_boundary(&self.text, cursor);
        self.scroll_top = scroll.min(self.last_line());
    }

    /// Local typing: the new content with the cursor after the change.
    pub fn type_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn scroll_to(&mut self, line: usize) {
        self.scroll_top = line.min(self.last_line());
    }

    /// Move the cursor to a 1-based line and column, clamped to the text.
    pub fn set_cursor(&mut self, line: u32, column: u32) {
        let line = line.max(1) as usize - 1;
        let column = column.max(1) as usize - 1;

        let mut offset = 0;
        for (index, content) in self.text.split('\n').enumerate() {
            if index == line {
                let within = content
                    .char_indices()
                    .nth(column)
                    .map_or(content.len(), |(i, _)| i);
                self.cursor = offset + within;
                return;
            }
            offset += content.len() + 1;
        }
        self.cursor = self.text.len();
    }

    /// 1-based line and column of the cursor.
    pub fn cursor_position(&self) -> (u32, u32) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (to_u32(line), to_u32(column))
    }

    fn last_line(&self) -> usize {
        self.text.matches('\n').count()
    }
}

fn clamp_to_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
