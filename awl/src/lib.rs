pub mod block;
pub mod instruction;
pub mod parser;
pub mod token;
pub mod variable;

use std::collections::BTreeMap;

use crate::block::{Block, BlockId, BlockKind, BlockRef};
use crate::instruction::Instruction;

pub use crate::parser::{Encoding, ErrorKind, ParseError, Parser, ParserOptions};

/// The raw, unresolved result of parsing one AWL source.
#[derive(Debug, Clone)]
pub struct ParseTree {
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
    /// Human-readable source name.
    pub source_name: String,
    blocks: BTreeMap<BlockKind, BTreeMap<BlockId, Block>>,
    current: Option<BlockRef>,
}

impl ParseTree {
    pub fn new(source_id: usize, source_name: impl Into<String>) -> Self {
        ParseTree {
            source_id,
            source_name: source_name.into(),
            blocks: BlockKind::ALL
                .into_iter()
                .map(|kind| (kind, BTreeMap::new()))
                .collect(),
            current: None,
        }
    }

    /// All blocks of one kind, ordered by id.
    pub fn blocks(&self, kind: BlockKind) -> &BTreeMap<BlockId, Block> {
        // Every kind is seeded in `new`.
        &self.blocks[&kind]
    }

    pub fn get(&self, kind: BlockKind, id: &BlockId) -> Option<&Block> {
        self.blocks.get(&kind)?.get(id)
    }

    pub fn resolve(&self, block: &BlockRef) -> Option<&Block> {
        self.get(block.kind, &block.id)
    }

    /// The block an instruction belongs to.
    pub fn instruction_block(&self, insn: &Instruction) -> Option<&Block> {
        self.resolve(&insn.block)
    }

    /// All blocks, grouped by kind in declaration order of [`BlockKind`].
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values().flat_map(|m| m.values())
    }

    pub fn block_count(&self) -> usize {
        self.blocks.values().map(BTreeMap::len).sum()
    }

    /// Instructions across all code blocks.
    pub fn instruction_count(&self) -> usize {
        self.iter()
            .filter_map(Block::as_code)
            .map(|code| code.instructions.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// The block currently being built, if any.
    pub fn current(&self) -> Option<&BlockRef> {
        self.current.as_ref()
    }

    pub(crate) fn current_block_mut(&mut self) -> Option<&mut Block> {
        let current = self.current.as_ref()?;
        self.blocks.get_mut(&current.kind)?.get_mut(&current.id)
    }

    /// Register a new block and make it current. Returns the block back if
    /// the id is already taken.
    pub(crate) fn open_block(&mut self, block: Block) -> Result<(), Block> {
        let block_ref = block.block_ref();
        let map = self.blocks.entry(block_ref.kind).or_default();
        if map.contains_key(&block_ref.id) {
            return Err(block);
        }
        map.insert(block_ref.id.clone(), block);
        self.current = Some(block_ref);
        Ok(())
    }

    pub(crate) fn close_block(&mut self) -> Option<BlockRef> {
        self.current.take()
    }
}
