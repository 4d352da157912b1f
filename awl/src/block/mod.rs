pub mod descriptor;

use std::fmt;

use crate::block::descriptor::Descriptors;
use crate::instruction::Instruction;
use crate::token::Token;
use crate::variable::{DataField, DataInit};

/// The five kinds of compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKind {
    Ob,
    Fb,
    Fc,
    Db,
    Udt,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Ob,
        BlockKind::Fb,
        BlockKind::Fc,
        BlockKind::Db,
        BlockKind::Udt,
    ];

    /// Prefix used in numeric ids (`OB 1`, `DB10`, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            BlockKind::Ob => "OB",
            BlockKind::Fb => "FB",
            BlockKind::Fc => "FC",
            BlockKind::Db => "DB",
            BlockKind::Udt => "UDT",
        }
    }

    /// Keyword that opens a block of this kind.
    pub fn open_keyword(self) -> &'static str {
        match self {
            BlockKind::Ob => "ORGANIZATION_BLOCK",
            BlockKind::Fb => "FUNCTION_BLOCK",
            BlockKind::Fc => "FUNCTION",
            BlockKind::Db => "DATA_BLOCK",
            BlockKind::Udt => "TYPE",
        }
    }

    /// Keyword that closes a block of this kind.
    pub fn end_keyword(self) -> &'static str {
        match self {
            BlockKind::Ob => "END_ORGANIZATION_BLOCK",
            BlockKind::Fb => "END_FUNCTION_BLOCK",
            BlockKind::Fc => "END_FUNCTION",
            BlockKind::Db => "END_DATA_BLOCK",
            BlockKind::Udt => "END_TYPE",
        }
    }

    pub fn from_open_keyword(word: &str) -> Option<BlockKind> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| word.eq_ignore_ascii_case(kind.open_keyword()))
    }

    pub fn from_end_keyword(word: &str) -> Option<BlockKind> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| word.eq_ignore_ascii_case(kind.end_keyword()))
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A block number or a quoted symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockId {
    Number(u16),
    /// Symbol name without the surrounding quotes.
    Symbol(String),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "{}", n),
            BlockId::Symbol(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Non-owning reference to a block in a [`ParseTree`](crate::ParseTree).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef {
    pub kind: BlockKind,
    pub id: BlockId,
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Variable section of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarSection {
    Input,
    Output,
    InOut,
    /// `VAR`: instance data, function blocks only.
    Static,
    Temp,
}

impl VarSection {
    pub fn from_keyword(word: &str) -> Option<VarSection> {
        match word.to_ascii_uppercase().as_str() {
            "VAR_INPUT" => Some(VarSection::Input),
            "VAR_OUTPUT" => Some(VarSection::Output),
            "VAR_IN_OUT" => Some(VarSection::InOut),
            "VAR" => Some(VarSection::Static),
            "VAR_TEMP" => Some(VarSection::Temp),
            _ => None,
        }
    }

    /// Only static variables may carry a default value.
    pub fn allows_initializer(self) -> bool {
        matches!(self, VarSection::Static)
    }

    /// Whether a block of `kind` may declare this section.
    pub fn allowed_in(self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Fb => true,
            BlockKind::Fc => !matches!(self, VarSection::Static),
            BlockKind::Ob => matches!(self, VarSection::Temp),
            BlockKind::Db | BlockKind::Udt => false,
        }
    }
}

/// An organization block, function block or function.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub id: BlockId,
    pub descriptors: Descriptors,
    pub instructions: Vec<Instruction>,
    pub inputs: Vec<DataField>,
    pub outputs: Vec<DataField>,
    pub in_outs: Vec<DataField>,
    pub temps: Vec<DataField>,
    /// Instance variables (function blocks only).
    pub statics: Vec<DataField>,
    /// Return type tokens (functions only).
    pub return_type: Option<Vec<Token>>,
}

impl CodeBlock {
    pub fn new(id: BlockId) -> Self {
        CodeBlock {
            id,
            descriptors: Descriptors::default(),
            instructions: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            in_outs: Vec::new(),
            temps: Vec::new(),
            statics: Vec::new(),
            return_type: None,
        }
    }

    pub fn section(&self, section: VarSection) -> &[DataField] {
        match section {
            VarSection::Input => &self.inputs,
            VarSection::Output => &self.outputs,
            VarSection::InOut => &self.in_outs,
            VarSection::Static => &self.statics,
            VarSection::Temp => &self.temps,
        }
    }

    pub fn section_mut(&mut self, section: VarSection) -> &mut Vec<DataField> {
        match section {
            VarSection::Input => &mut self.inputs,
            VarSection::Output => &mut self.outputs,
            VarSection::InOut => &mut self.in_outs,
            VarSection::Static => &mut self.statics,
            VarSection::Temp => &mut self.temps,
        }
    }
}

/// The function block a DB is an instance of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceBinding {
    Fb(BlockId),
    Sfb(u16),
}

/// A data block.
#[derive(Debug, Clone)]
pub struct DataBlock {
    pub id: BlockId,
    pub descriptors: Descriptors,
    pub fields: Vec<DataField>,
    /// Assignments from the block body (`name := value`).
    pub field_inits: Vec<DataInit>,
    pub instance_of: Option<InstanceBinding>,
}

impl DataBlock {
    pub fn new(id: BlockId) -> Self {
        DataBlock {
            id,
            descriptors: Descriptors::default(),
            fields: Vec::new(),
            field_inits: Vec::new(),
            instance_of: None,
        }
    }
}

/// A user-defined type.
#[derive(Debug, Clone)]
pub struct UserType {
    pub id: BlockId,
    pub descriptors: Descriptors,
    pub fields: Vec<DataField>,
}

impl UserType {
    pub fn new(id: BlockId) -> Self {
        UserType {
            id,
            descriptors: Descriptors::default(),
            fields: Vec::new(),
        }
    }
}

/// One compilation unit of a source file.
#[derive(Debug, Clone)]
pub enum Block {
    Ob(CodeBlock),
    Fb(CodeBlock),
    Fc(CodeBlock),
    Db(DataBlock),
    Udt(UserType),
}

impl Block {
    pub fn new(kind: BlockKind, id: BlockId) -> Self {
        match kind {
            BlockKind::Ob => Block::Ob(CodeBlock::new(id)),
            BlockKind::Fb => Block::Fb(CodeBlock::new(id)),
            BlockKind::Fc => Block::Fc(CodeBlock::new(id)),
            BlockKind::Db => Block::Db(DataBlock::new(id)),
            BlockKind::Udt => Block::Udt(UserType::new(id)),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Ob(_) => BlockKind::Ob,
            Block::Fb(_) => BlockKind::Fb,
            Block::Fc(_) => BlockKind::Fc,
            Block::Db(_) => BlockKind::Db,
            Block::Udt(_) => BlockKind::Udt,
        }
    }

    pub fn id(&self) -> &BlockId {
        match self {
            Block::Ob(b) | Block::Fb(b) | Block::Fc(b) => &b.id,
            Block::Db(b) => &b.id,
            Block::Udt(b) => &b.id,
        }
    }

    pub fn block_ref(&self) -> BlockRef {
        BlockRef {
            kind: self.kind(),
            id: self.id().clone(),
        }
    }

    pub fn descriptors(&self) -> &Descriptors {
        match self {
            Block::Ob(b) | Block::Fb(b) | Block::Fc(b) => &b.descriptors,
            Block::Db(b) => &b.descriptors,
            Block::Udt(b) => &b.descriptors,
        }
    }

    pub fn descriptors_mut(&mut self) -> &mut Descriptors {
        match self {
            Block::Ob(b) | Block::Fb(b) | Block::Fc(b) => &mut b.descriptors,
            Block::Db(b) => &mut b.descriptors,
            Block::Udt(b) => &mut b.descriptors,
        }
    }

    pub fn as_code(&self) -> Option<&CodeBlock> {
        match self {
            Block::Ob(b) | Block::Fb(b) | Block::Fc(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_code_mut(&mut self) -> Option<&mut CodeBlock> {
        match self {
            Block::Ob(b) | Block::Fb(b) | Block::Fc(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_db(&self) -> Option<&DataBlock> {
        match self {
            Block::Db(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_db_mut(&mut self) -> Option<&mut DataBlock> {
        match self {
            Block::Db(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_udt(&self) -> Option<&UserType> {
        match self {
            Block::Udt(b) => Some(b),
            _ => None,
        }
    }

    /// Struct fields of a DB or UDT.
    pub fn fields_mut(&mut self) -> Option<&mut Vec<DataField>> {
        match self {
            Block::Db(b) => Some(&mut b.fields),
            Block::Udt(b) => Some(&mut b.fields),
            _ => None,
        }
    }
}
