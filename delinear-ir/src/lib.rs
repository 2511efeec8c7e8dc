//! Read-only typed SSA IR consumed by the delinear decompiler core.
//!
//! This crate is never mutated by the core: it is the fixed, upstream-
//! produced input that `delinear-structure` walks to build the first-cut
//! AST.

pub mod condcodes;
pub mod dfg;
pub mod entities;
pub mod error;
pub mod function;
pub mod instructions;
pub mod layout;
pub mod module;
pub mod types;

pub use condcodes::{CondCode, IntCC};
pub use dfg::{DataFlowGraph, ValueDef};
pub use entities::{Block, Inst, IrEntity, Value};
pub use error::IrError;
pub use function::{Function, Signature};
pub use instructions::{BinaryOp, InstructionData, SwitchCase, Terminator, UnaryOp};
pub use layout::Layout;
pub use module::Module;
pub use types::Type;
