//! Character-level scanner that splits AWL source into statements.
//!
//! How characters are grouped depends on what the dispatcher expects next,
//! so the scanner is pulled one statement at a time with the current
//! [`ScanMode`].

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

use crate::block::BlockKind;
use crate::parser::error::{ErrorKind, ParseError};
use crate::token::Token;

/// Scanner behaviour selected by the dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanMode {
    /// Between blocks. `:` is a separator; a complete block header ends
    /// the statement.
    Global,
    /// Block header. `KEY = value` and `KEY : value` capture the rest of
    /// the line.
    Header,
    /// Inside `{ ... }` attributes of a header.
    Attributes,
    /// Variable declarations and DB assignments. Newlines do not end a
    /// statement; `= : .. { }` are separators.
    Declaration,
    /// Instruction bodies.
    Body,
}

const HEADER_SECTION_KEYWORDS: &[&str] = &[
    "BEGIN",
    "STRUCT",
    "VAR",
    "VAR_INPUT",
    "VAR_OUTPUT",
    "VAR_IN_OUT",
    "VAR_TEMP",
    "END_TYPE",
    "KNOW_HOW_PROTECT",
];

const DECLARATION_END_KEYWORDS: &[&str] = &["END_STRUCT", "END_VAR", "END_DATA_BLOCK"];

impl ScanMode {
    fn ends_on_newline(self) -> bool {
        !matches!(self, ScanMode::Declaration)
    }

    fn splits_colon(self) -> bool {
        matches!(
            self,
            ScanMode::Global | ScanMode::Header | ScanMode::Declaration
        )
    }

    /// Whether a statement is complete as soon as whitespace follows it.
    fn ends_early(self, tokens: &[Token]) -> bool {
        let is_sole_keyword = |keywords: &[&str]| {
            tokens.len() == 1 && keywords.iter().any(|kw| tokens[0].is(kw))
        };
        match self {
            ScanMode::Global => is_complete_header(tokens),
            ScanMode::Header => is_sole_keyword(HEADER_SECTION_KEYWORDS),
            ScanMode::Declaration => is_sole_keyword(DECLARATION_END_KEYWORDS),
            ScanMode::Attributes | ScanMode::Body => false,
        }
    }
}

/// `DATA_BLOCK DB 1`, `TYPE UDT7`, `FUNCTION_BLOCK "Motor"`, ...
/// Functions are excluded: their return type may span several tokens.
fn is_complete_header(tokens: &[Token]) -> bool {
    let Some(kind) = tokens.first().and_then(|t| BlockKind::from_open_keyword(&t.text)) else {
        return false;
    };
    if kind == BlockKind::Fc {
        return false;
    }
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match tokens {
        [_, id] => {
            id.is_quoted()
                || (id.text.len() > kind.prefix().len()
                    && id.text.is_char_boundary(kind.prefix().len())
                    && id.text[..kind.prefix().len()].eq_ignore_ascii_case(kind.prefix())
                    && is_number(&id.text[kind.prefix().len()..]))
        }
        [_, prefix, number] => prefix.is(kind.prefix()) && is_number(&number.text),
        _ => false,
    }
}

/// One statement: a non-empty token list.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub tokens: Vec<Token>,
}

impl Statement {
    pub fn first(&self) -> &Token {
        &self.tokens[0]
    }

    pub fn line(&self) -> usize {
        self.first().line
    }

    pub fn span(&self) -> Range<usize> {
        let start = self.first().offset;
        let end = self.tokens.last().map(|t| t.span().end).unwrap_or(start);
        start..end
    }

    pub fn contains(&self, text: &str) -> bool {
        self.tokens.iter().any(|t| t.text.contains(text))
    }
}

#[derive(Default)]
struct StatementBuilder {
    tokens: Vec<Token>,
    current: String,
    current_line: usize,
    current_offset: usize,
    quote: Option<char>,
    parens: usize,
    comment: bool,
    capture: Option<Token>,
}

impl StatementBuilder {
    fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.current.is_empty()
    }

    fn push_char(&mut self, c: char, line: usize, offset: usize) {
        if self.current.is_empty() {
            self.current_line = line;
            self.current_offset = offset;
        }
        self.current.push(c);
    }

    fn finish_token(&mut self) {
        if !self.current.is_empty() {
            let text = std::mem::take(&mut self.current);
            self.tokens
                .push(Token::new(text, self.current_line, self.current_offset));
        }
    }

    fn push_token(&mut self, text: &str, line: usize, offset: usize) {
        self.finish_token();
        self.tokens.push(Token::new(text, line, offset));
    }

    fn has_label(&self) -> bool {
        self.tokens.first().is_some_and(|t| t.text.ends_with(':'))
    }

    /// `(` opens a parameter list once the mnemonic is complete; before
    /// that it belongs to the mnemonic itself (`U(`, `O(`).
    fn opens_parameter_list(&self) -> bool {
        let needed = if self.has_label() { 2 } else { 1 };
        self.tokens.len() >= needed
    }

    fn end_capture(&mut self) {
        if let Some(mut captured) = self.capture.take() {
            let trimmed = captured.text.trim();
            if !trimmed.is_empty() {
                let lead = captured.text.len() - captured.text.trim_start().len();
                captured.offset += lead;
                captured.text = trimmed.to_string();
                self.tokens.push(captured);
            }
        }
    }

    fn finish(mut self) -> Option<Statement> {
        self.end_capture();
        self.finish_token();
        if self.tokens.is_empty() {
            None
        } else {
            Some(Statement {
                tokens: self.tokens,
            })
        }
    }
}

pub(crate) struct Tokenizer<'a> {
    chars: Peekable<CharIndices<'a>>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Tokenizer {
            chars: text.char_indices().peekable(),
            line: 1,
        }
    }

    /// Line of the most recently consumed character.
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_is(&mut self, expected: char) -> bool {
        self.chars.peek().is_some_and(|&(_, c)| c == expected)
    }

    /// Scan the next statement, or `None` at end of input.
    pub fn next_statement(&mut self, mode: ScanMode) -> Result<Option<Statement>, ParseError> {
        let mut st = StatementBuilder::default();

        while let Some((offset, c)) = self.chars.next() {
            let line = self.line;

            if st.comment {
                if c == '\n' {
                    st.comment = false;
                    self.line += 1;
                    if st.parens == 0 && !st.is_empty() {
                        return Ok(st.finish());
                    }
                }
                continue;
            }

            if let Some(captured) = &mut st.capture {
                if c == '\n' {
                    self.line += 1;
                    return Ok(st.finish());
                }
                if captured.text.is_empty() {
                    captured.offset = offset;
                }
                captured.text.push(c);
                continue;
            }

            if let Some(quote) = st.quote {
                st.push_char(c, line, offset);
                if c == quote {
                    st.quote = None;
                }
                if c == '\n' {
                    self.line += 1;
                }
                continue;
            }

            match c {
                '"' | '\'' => {
                    st.push_char(c, line, offset);
                    st.quote = Some(c);
                }
                '/' if self.next_is('/') => {
                    self.chars.next();
                    st.finish_token();
                    st.comment = true;
                }
                '(' if st.parens > 0 || st.opens_parameter_list() => {
                    st.push_token("(", line, offset);
                    st.parens += 1;
                }
                ')' if st.parens > 0 => {
                    st.push_token(")", line, offset);
                    st.parens -= 1;
                }
                ';' if st.parens == 0 => {
                    if let Some(statement) = std::mem::take(&mut st).finish() {
                        return Ok(Some(statement));
                    }
                }
                ',' | '[' | ']' => st.push_token(&c.to_string(), line, offset),
                ':' if mode.splits_colon() => {
                    if self.next_is('=') {
                        self.chars.next();
                        st.push_token(":=", line, offset);
                    } else {
                        st.push_token(":", line, offset);
                        // `KEY : value` in a header keeps the value verbatim.
                        if mode == ScanMode::Header && st.parens == 0 && st.tokens.len() == 2 {
                            st.capture = Some(Token::new(String::new(), line, offset + 1));
                        }
                    }
                }
                '=' | '{' | '}' if mode == ScanMode::Declaration => {
                    st.push_token(&c.to_string(), line, offset);
                }
                '.' if mode == ScanMode::Declaration && self.next_is('.') => {
                    self.chars.next();
                    st.push_token("..", line, offset);
                }
                '=' if mode == ScanMode::Header && st.parens == 0 => {
                    st.finish_token();
                    if st.tokens.len() == 1 {
                        st.push_token("=", line, offset);
                        st.capture = Some(Token::new(String::new(), line, offset + 1));
                    } else {
                        st.push_char(c, line, offset);
                    }
                }
                c if c.is_whitespace() => {
                    st.finish_token();
                    if c == '\n' {
                        self.line += 1;
                    }
                    if st.parens == 0
                        && !st.tokens.is_empty()
                        && ((c == '\n' && mode.ends_on_newline()) || mode.ends_early(&st.tokens))
                    {
                        return Ok(st.finish());
                    }
                }
                _ => st.push_char(c, line, offset),
            }
        }

        if st.quote.is_some() {
            return Err(ParseError::new(
                ErrorKind::UnterminatedQuote,
                "unterminated quote at end of input",
            )
            .at_line(self.line));
        }
        if st.parens > 0 {
            return Err(ParseError::new(
                ErrorKind::UnterminatedParenthesis,
                "unterminated parenthesis at end of input",
            )
            .at_line(self.line));
        }
        Ok(st.finish())
    }
}
