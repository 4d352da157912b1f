//! Statement dispatcher: a state machine over block headers, variable
//! sections and bodies that builds the [`ParseTree`].

use tracing::{debug, trace, warn};

use crate::ParseTree;
use crate::block::descriptor::DescriptorKey;
use crate::block::{Block, BlockId, BlockKind, InstanceBinding, VarSection};
use crate::parser::declaration::{parse_db_assignment, parse_declaration};
use crate::parser::error::{ErrorKind, ParseError};
use crate::parser::instruction::parse_instruction;
use crate::parser::tokenizer::{ScanMode, Statement};
use crate::token::{Token, join};

/// Where the dispatcher is in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Between blocks.
    Global,
    /// Block header, before `BEGIN`.
    Header(BlockKind),
    /// `STRUCT ... END_STRUCT` of a DB or UDT header.
    Struct(BlockKind),
    /// `VAR_* ... END_VAR` of a code block header.
    Variables(BlockKind, VarSection),
    /// `{ ... }` attributes of a header.
    Attributes(BlockKind),
    /// After `BEGIN`.
    Body(BlockKind),
}

impl State {
    pub fn scan_mode(self) -> ScanMode {
        match self {
            State::Global => ScanMode::Global,
            State::Header(_) => ScanMode::Header,
            State::Attributes(_) => ScanMode::Attributes,
            State::Struct(_) | State::Variables(..) | State::Body(BlockKind::Db) => {
                ScanMode::Declaration
            }
            State::Body(_) => ScanMode::Body,
        }
    }
}

fn unknown(message: impl Into<String>) -> ParseError {
    ParseError::new(ErrorKind::UnknownStatement, message)
}

fn unknown_in_header(kind: BlockKind, statement: &Statement) -> ParseError {
    unknown(format!(
        "unknown statement '{}' in {} header (missing semicolon in preceding lines?)",
        join(&statement.tokens),
        kind
    ))
}

/// Parse `"Symbol"`, `DB 7` or `DB7`. Returns the id and the number of
/// tokens it used.
fn parse_block_id(tokens: &[Token], prefix: &str) -> Option<(BlockId, usize)> {
    let first = tokens.first()?;
    if first.is_quoted() {
        let name = &first.text[1..first.text.len() - 1];
        return Some((BlockId::Symbol(name.to_string()), 1));
    }
    if first.is(prefix) {
        let number = tokens.get(1)?.text.parse::<u16>().ok()?;
        return Some((BlockId::Number(number), 2));
    }
    let head = first.text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let number = first.text[prefix.len()..].parse::<u16>().ok()?;
    Some((BlockId::Number(number), 1))
}

/// `FB 10`, `SFB 4` or `"Motor"` in a DB header.
fn parse_instance_binding(tokens: &[Token]) -> Option<InstanceBinding> {
    match parse_block_id(tokens, "FB") {
        Some((id, used)) if used == tokens.len() => return Some(InstanceBinding::Fb(id)),
        _ => {}
    }
    match parse_block_id(tokens, "SFB") {
        Some((BlockId::Number(n), used)) if used == tokens.len() => Some(InstanceBinding::Sfb(n)),
        _ => None,
    }
}

/// Parser context owned by a single parse.
pub(crate) struct ParseContext {
    tree: ParseTree,
    state: State,
    flat: bool,
}

impl ParseContext {
    pub fn new(source_id: usize, source_name: &str) -> Self {
        ParseContext {
            tree: ParseTree::new(source_id, source_name),
            state: State::Global,
            flat: false,
        }
    }

    /// A source without any block keywords: every statement is an
    /// instruction of an implicit OB 1.
    pub fn flat(source_id: usize, source_name: &str) -> Self {
        let mut tree = ParseTree::new(source_id, source_name);
        // A fresh tree cannot already contain OB 1.
        let _ = tree.open_block(Block::new(BlockKind::Ob, BlockId::Number(1)));
        ParseContext {
            tree,
            state: State::Body(BlockKind::Ob),
            flat: true,
        }
    }

    pub fn scan_mode(&self) -> ScanMode {
        self.state.scan_mode()
    }

    pub fn dispatch(&mut self, statement: Statement) -> Result<(), ParseError> {
        let line = statement.line();
        let span = statement.span();
        trace!(state = ?self.state, token = %statement.first().text, line, "dispatch");

        let next = match self.state {
            State::Global => self.global(statement),
            State::Header(kind) => self.header(kind, statement),
            State::Struct(kind) => self.structure(kind, statement),
            State::Variables(kind, section) => self.variables(kind, section, statement),
            State::Attributes(kind) => Ok(if statement.contains("}") {
                State::Header(kind)
            } else {
                State::Attributes(kind)
            }),
            State::Body(kind) => self.body(kind, statement),
        }
        .map_err(|e| e.or_location(line, span))?;

        self.state = next;
        Ok(())
    }

    /// Finish the parse at end of input.
    pub fn finish(mut self, require_block_end: bool, last_line: usize) -> Result<ParseTree, ParseError> {
        if self.state != State::Global && !self.flat {
            let block = self
                .tree
                .current()
                .map(|b| b.to_string())
                .unwrap_or_default();
            if require_block_end {
                return Err(ParseError::new(
                    ErrorKind::UnterminatedBlock,
                    format!("end of input inside {}", block),
                )
                .at_line(last_line));
            }
            warn!(block = %block, state = ?self.state, "end of input inside a block");
        }
        self.tree.close_block();
        Ok(self.tree)
    }

    fn current(&mut self) -> Result<&mut Block, ParseError> {
        self.tree
            .current_block_mut()
            .ok_or_else(|| unknown("statement outside of a block"))
    }

    fn global(&mut self, statement: Statement) -> Result<State, ParseError> {
        let first = statement.first();
        let Some(kind) = BlockKind::from_open_keyword(&first.text) else {
            return Err(unknown(format!(
                "unknown statement '{}' outside of a block",
                join(&statement.tokens)
            )));
        };

        let rest = &statement.tokens[1..];
        let Some((id, used)) = parse_block_id(rest, kind.prefix()) else {
            return Err(unknown(format!(
                "expected '{} <number>' or a quoted name after {}",
                kind.prefix(),
                kind.open_keyword()
            )));
        };
        let rest = &rest[used..];

        let mut block = Block::new(kind, id);
        if let Some(code) = block.as_code_mut().filter(|_| kind == BlockKind::Fc) {
            match rest.split_first() {
                Some((colon, return_type)) if colon.text == ":" && !return_type.is_empty() => {
                    code.return_type = Some(return_type.to_vec());
                }
                _ => {
                    return Err(ParseError::new(
                        ErrorKind::MalformedDeclaration,
                        "FUNCTION requires a return type (': TYPE')",
                    ));
                }
            }
        } else if !rest.is_empty() {
            return Err(unknown(format!(
                "unexpected '{}' after {} header",
                join(rest),
                kind
            )));
        }

        let block_ref = block.block_ref();
        if self.tree.open_block(block).is_err() {
            return Err(ParseError::new(
                ErrorKind::DuplicateBlock,
                format!("{} is already defined", block_ref),
            ));
        }
        debug!(block = %block_ref, "opened block");
        Ok(State::Header(kind))
    }

    fn header(&mut self, kind: BlockKind, statement: Statement) -> Result<State, ParseError> {
        let first = statement.first();

        if let Some(key) = DescriptorKey::from_keyword(&first.text) {
            self.set_descriptor(key, &statement.tokens[1..])?;
            return Ok(State::Header(kind));
        }

        if let Some(section) = VarSection::from_keyword(&first.text) {
            if !section.allowed_in(kind) || statement.tokens.len() != 1 {
                return Err(unknown_in_header(kind, &statement));
            }
            return Ok(State::Variables(kind, section));
        }

        if first.text.starts_with('{') {
            return Ok(if statement.contains("}") {
                State::Header(kind)
            } else {
                State::Attributes(kind)
            });
        }

        let word = first.text.to_ascii_uppercase();
        match (word.as_str(), kind) {
            ("STANDARD" | "KNOW_HOW_PROTECT", _) => Ok(State::Header(kind)),
            ("BEGIN", BlockKind::Udt) => Err(unknown_in_header(kind, &statement)),
            ("BEGIN", _) => Ok(State::Body(kind)),
            ("STRUCT", BlockKind::Db | BlockKind::Udt) => Ok(State::Struct(kind)),
            ("END_TYPE", BlockKind::Udt) => {
                self.close_block();
                Ok(State::Global)
            }
            (_, BlockKind::Db) => match parse_instance_binding(&statement.tokens) {
                Some(binding) => {
                    self.bind_instance(binding)?;
                    Ok(State::Header(kind))
                }
                None => Err(unknown_in_header(kind, &statement)),
            },
            _ => Err(unknown_in_header(kind, &statement)),
        }
    }

    fn set_descriptor(&mut self, key: DescriptorKey, tokens: &[Token]) -> Result<(), ParseError> {
        let value = match tokens.split_first() {
            Some((sep, rest)) if sep.text == "=" || sep.text == ":" => rest,
            _ => tokens,
        };
        let value = join(value);
        let block = self.current()?;
        if !block.descriptors_mut().set(key, value) {
            return Err(ParseError::new(
                ErrorKind::DuplicateDescriptor,
                format!("{} is already set for {}", key, block.block_ref()),
            ));
        }
        Ok(())
    }

    fn bind_instance(&mut self, binding: InstanceBinding) -> Result<(), ParseError> {
        let block = self.current()?;
        let block_ref = block.block_ref();
        let Some(db) = block.as_db_mut() else {
            return Err(unknown("instance binding outside of a data block"));
        };
        if db.instance_of.is_some() {
            return Err(ParseError::new(
                ErrorKind::DuplicateDescriptor,
                format!("{} is already bound to a function block", block_ref),
            ));
        }
        db.instance_of = Some(binding);
        Ok(())
    }

    fn structure(&mut self, kind: BlockKind, statement: Statement) -> Result<State, ParseError> {
        if statement.first().is("END_STRUCT") {
            return Ok(State::Header(kind));
        }
        let field = parse_declaration(&statement.tokens, true)?;
        let fields = self
            .current()?
            .fields_mut()
            .ok_or_else(|| unknown("STRUCT outside of a data block or type"))?;
        fields.push(field);
        Ok(State::Struct(kind))
    }

    fn variables(
        &mut self,
        kind: BlockKind,
        section: VarSection,
        statement: Statement,
    ) -> Result<State, ParseError> {
        if statement.first().is("END_VAR") {
            return Ok(State::Header(kind));
        }
        let field = parse_declaration(&statement.tokens, section.allows_initializer())?;
        let code = self
            .current()?
            .as_code_mut()
            .ok_or_else(|| unknown("variable section outside of a code block"))?;
        code.section_mut(section).push(field);
        Ok(State::Variables(kind, section))
    }

    fn body(&mut self, kind: BlockKind, statement: Statement) -> Result<State, ParseError> {
        let first = statement.first();

        if let Some(end) = BlockKind::from_end_keyword(&first.text) {
            if end != kind {
                return Err(unknown(format!(
                    "{} cannot close {}",
                    first.text,
                    kind.open_keyword()
                )));
            }
            self.close_block();
            return Ok(State::Global);
        }

        if first.is("NETWORK") || first.is("TITLE") {
            return Ok(State::Body(kind));
        }

        if kind == BlockKind::Db {
            let init = parse_db_assignment(&statement.tokens)?;
            let db = self
                .current()?
                .as_db_mut()
                .ok_or_else(|| unknown("assignment outside of a data block"))?;
            db.field_inits.push(init);
            return Ok(State::Body(kind));
        }

        let source_id = self.tree.source_id;
        let block = self.current()?;
        let block_ref = block.block_ref();
        let instruction = parse_instruction(statement, source_id, block_ref)?;
        let code = block
            .as_code_mut()
            .ok_or_else(|| unknown("instruction outside of a code block"))?;
        code.instructions.push(instruction);
        Ok(State::Body(kind))
    }

    fn close_block(&mut self) {
        if let Some(block) = self.tree.close_block() {
            debug!(block = %block, "closed block");
        }
    }
}
