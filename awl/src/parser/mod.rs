mod declaration;
mod dispatch;
pub mod encoding;
pub mod error;
mod instruction;
mod tokenizer;

pub use encoding::Encoding;
pub use error::{ErrorKind, ParseError};

use serde::Deserialize;

use crate::ParseTree;
use crate::block::BlockKind;
use crate::parser::dispatch::ParseContext;
use crate::parser::tokenizer::Tokenizer;

/// Parser settings, usually read from the `[parser]` table of `awl.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParserOptions {
    /// Encoding of the raw source bytes.
    pub encoding: Encoding,
    /// Reject sources that end inside a block instead of logging a warning.
    pub require_block_end: bool,
}

/// Parser entry point. One parse per call; nothing is shared between calls.
pub struct Parser {
    source_id: usize,
    source_name: String,
    options: ParserOptions,
}

impl Parser {
    /// `source_id` and `source_name` only label errors and the tree.
    pub fn new(source_id: usize, source_name: impl Into<String>) -> Self {
        Parser {
            source_id,
            source_name: source_name.into(),
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Decode raw source bytes with the configured encoding.
    pub fn decode(&self, raw: &[u8]) -> Result<String, ParseError> {
        self.options
            .encoding
            .decode(raw)
            .map_err(|e| e.or_source(self.source_id, &self.source_name))
    }

    /// Decode and parse raw source bytes.
    pub fn parse(&self, raw: &[u8]) -> Result<ParseTree, ParseError> {
        let text = self.decode(raw)?;
        self.parse_text(&text)
    }

    /// Parse already decoded source text into a complete ParseTree.
    pub fn parse_text(&self, text: &str) -> Result<ParseTree, ParseError> {
        self.run(text)
            .map_err(|e| e.or_source(self.source_id, &self.source_name))
    }

    fn run(&self, text: &str) -> Result<ParseTree, ParseError> {
        let mut context = if has_block_keywords(text) {
            ParseContext::new(self.source_id, &self.source_name)
        } else {
            tracing::debug!(source = %self.source_name, "no block keywords, using flat layout");
            ParseContext::flat(self.source_id, &self.source_name)
        };

        let mut tokenizer = Tokenizer::new(text);
        while let Some(statement) = tokenizer.next_statement(context.scan_mode())? {
            context.dispatch(statement)?;
        }
        context.finish(self.options.require_block_end, tokenizer.line())
    }
}

/// Whether the source contains a block-opening keyword as a whole word.
/// Quoted symbols and strings and `//` comments are skipped, with the same
/// quote toggling as the tokenizer.
fn has_block_keywords(text: &str) -> bool {
    let is_keyword = |word: &str| BlockKind::from_open_keyword(word).is_some();
    let mut chars = text.chars().peekable();
    let mut word = String::new();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if is_keyword(&word) {
            return true;
        }
        word.clear();
        match c {
            '"' | '\'' => quote = Some(c),
            '/' if chars.peek() == Some(&'/') => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            _ => {}
        }
    }
    is_keyword(&word)
}
