use crate::block::BlockRef;
use crate::token::Token;

/// A single raw statement-list instruction.
///
/// The mnemonic and operands are kept unparsed; resolving them is the job of
/// later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Jump label without the trailing colon.
    pub label: Option<String>,
    /// Mnemonic, verbatim.
    pub name: String,
    pub operands: Vec<Token>,
    pub source_id: usize,
    /// 1-based line of the first token.
    pub line: usize,
    /// The block this instruction belongs to.
    pub block: BlockRef,
}

impl Instruction {
    pub fn operand_texts(&self) -> Vec<&str> {
        self.operands.iter().map(|t| t.text.as_str()).collect()
    }
}
