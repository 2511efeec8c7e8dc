//! Opaque references to entities inside a [`crate::function::Function`].
//!
//! These mirror the "typed index into an arena" discipline used throughout
//! the IR: a `Block` or `Value` is a 32-bit index, never a pointer, so the
//! IR stays cheaply `Copy` and immune to aliasing trouble while the decompiler
//! core walks it read-only.

use cranelift_entity::entity_impl;
use std::fmt;

/// A basic block in a function's control-flow graph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block(u32);
entity_impl!(Block, "block");

/// An SSA value: the result of an instruction, a block parameter, or a
/// function argument.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(u32);
entity_impl!(Value, "v");

/// An instruction, including block terminators.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inst(u32);
entity_impl!(Inst, "inst");

/// Any IR entity a provenance map might point back to. `delinear-ast`
/// stores these as the "IR-entity" half of its AST-node -> IR-entity map.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum IrEntity {
    Value(Value),
    Inst(Inst),
    Block(Block),
}

impl From<Value> for IrEntity {
    fn from(v: Value) -> Self {
        IrEntity::Value(v)
    }
}

impl From<Inst> for IrEntity {
    fn from(i: Inst) -> Self {
        IrEntity::Inst(i)
    }
}

impl From<Block> for IrEntity {
    fn from(b: Block) -> Self {
        IrEntity::Block(b)
    }
}

impl fmt::Display for IrEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrEntity::Value(v) => write!(f, "{v}"),
            IrEntity::Inst(i) => write!(f, "{i}"),
            IrEntity::Block(b) => write!(f, "{b}"),
        }
    }
}
