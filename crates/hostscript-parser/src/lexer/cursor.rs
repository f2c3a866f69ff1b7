/// A cursor over script text that tracks position.
///
/// Provides peek/advance access to characters while keeping the byte
/// offset, line and column of the current position.
pub struct Cursor<'src> {
    source: &'src str,
    /// Remaining text, starting at the current position.
    rest: &'src str,
    offset: u32,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed, in characters).
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume the current character, updating line and column.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.peek().is_some_and(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Slice of the source from `start` to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("hello");
        assert_eq!(cursor.peek(), Some('h'));
        assert_eq!(cursor.advance(), Some('h'));
        assert_eq!(cursor.peek(), Some('e'));
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn cursor_eat_while() {
        let mut cursor = Cursor::new("aaabbb");
        assert_eq!(cursor.eat_while(|c| c == 'a'), "aaa");
        assert_eq!(cursor.eat_while(|c| c == 'b'), "bbb");
        assert!(cursor.is_eof());
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn cursor_tracks_lines() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn cursor_counts_characters_not_bytes() {
        let mut cursor = Cursor::new("héllo");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 3);
        assert_eq!(cursor.slice_from(0), "hé");
    }

    #[test]
    fn identifiers() {
        assert!(is_ident_start('_'));
        assert!(is_ident_start('ä'));
        assert!(!is_ident_start('1'));
        assert!(is_ident_continue('1'));
    }
}
