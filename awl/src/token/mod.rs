use std::ops::Range;

/// One lexical token of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text, verbatim from the source (quotes included).
    pub text: String,
    /// 1-based line on which the token started.
    pub line: usize,
    /// Byte offset of the first character in the decoded source.
    pub offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, line: usize, offset: usize) -> Self {
        Token {
            text: text.into(),
            line,
            offset,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }

    /// Case-insensitive keyword comparison.
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }

    /// True for `"..."` symbol references.
    pub fn is_quoted(&self) -> bool {
        self.text.len() >= 2 && self.text.starts_with('"') && self.text.ends_with('"')
    }
}

/// Join token texts with single spaces.
pub fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
