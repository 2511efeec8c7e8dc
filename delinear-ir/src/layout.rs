//! Block and instruction order within a function.
//!
//! A bare `Vec<Block>` (and a `Vec<Inst>` per block) is enough here: the
//! core never re-orders or re-inserts instructions into the IR -- it only
//! ever reads it once while building the initial AST. There is no in-place
//! IR editing to support.

use crate::entities::{Block, Inst};
use cranelift_entity::SecondaryMap;

#[derive(Default)]
pub struct Layout {
    block_order: Vec<Block>,
    entry: Option<Block>,
    insts: SecondaryMap<Block, Vec<Inst>>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_block(&mut self, block: Block) {
        if self.entry.is_none() {
            self.entry = Some(block);
        }
        self.block_order.push(block);
    }

    pub fn append_inst(&mut self, block: Block, inst: Inst) {
        self.insts[block].push(inst);
    }

    pub fn entry_block(&self) -> Block {
        self.entry.expect("layout has no blocks")
    }

    /// Blocks in the order the upstream lifter emitted them. Used only to
    /// break ties in reverse-post-order emission by stable block id.
    pub fn block_order(&self) -> &[Block] {
        &self.block_order
    }

    pub fn block_insts(&self, block: Block) -> &[Inst] {
        &self.insts[block]
    }
}
