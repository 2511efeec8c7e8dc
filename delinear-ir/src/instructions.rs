//! Instruction and terminator shapes.
//!
//! Every block is a sequence of [`InstructionData`] followed by exactly one
//! [`Terminator`]. Terminators are kept out of the regular instruction list
//! entirely, rather than recognized post hoc, so CFG construction never
//! needs to scan for them.

use crate::condcodes::IntCC;
use crate::entities::{Block, Value};
use crate::types::Type;

/// Binary arithmetic/bitwise/logical opcodes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
}

/// Unary opcodes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
    /// Boolean/logical negation, as produced by lowering `!x` at the IR
    /// level (distinct from bitwise `Not`).
    BoolNot,
}

/// The data carried by a non-terminator instruction. Each variant
/// corresponds to exactly one kind of IR value that the IR-to-expression
/// visitor knows how to translate.
#[derive(Clone, Debug)]
pub enum InstructionData {
    /// An integer or boolean constant.
    IConst { ty: Type, value: i64 },
    /// A floating point constant, stored as bits to keep `InstructionData: Eq`-friendly.
    FConst { ty: Type, bits: u64 },
    Binary { op: BinaryOp, ty: Type, lhs: Value, rhs: Value },
    Unary { op: UnaryOp, ty: Type, arg: Value },
    /// An integer comparison; always produces a `Type::Bool` value.
    ICmp { cc: IntCC, lhs: Value, rhs: Value },
    /// A direct call. Side-effecting: always materialized as a declaration
    /// with an initializer even when its result is unused.
    Call { callee: String, ty: Type, args: Vec<Value> },
    /// A memory load. Side-effecting per `has_side_effect` in the sense
    /// that DCE must not assume it is pure across stores, but harmless to
    /// reorder with itself; see `delinear-passes::dead_stmt` for the
    /// conservative treatment.
    Load { ty: Type, addr: Value },
    /// A memory store. Always side-effecting.
    Store { addr: Value, value: Value },
    /// A φ-node: selects among predecessor-block values. Lowered into a
    /// selector variable assigned on each incoming edge.
    Phi { ty: Type, incoming: Vec<(Block, Value)> },
    /// An opaque cast between IR types (e.g. sign/zero extension, truncation,
    /// pointer<->integer), rendered as a target-language cast.
    Cast { to: Type, from: Type, arg: Value },
}

impl InstructionData {
    /// The values this instruction reads, in evaluation order.
    pub fn args(&self) -> Vec<Value> {
        match self {
            InstructionData::IConst { .. } | InstructionData::FConst { .. } => vec![],
            InstructionData::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstructionData::Unary { arg, .. } => vec![*arg],
            InstructionData::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstructionData::Call { args, .. } => args.clone(),
            InstructionData::Load { addr, .. } => vec![*addr],
            InstructionData::Store { addr, value } => vec![*addr, *value],
            InstructionData::Phi { incoming, .. } => incoming.iter().map(|(_, v)| *v).collect(),
            InstructionData::Cast { arg, .. } => vec![*arg],
        }
    }

    /// Whether this instruction has an observable effect beyond producing a
    /// value (so DCE must keep it even if its result is unused).
    pub fn has_side_effect(&self) -> bool {
        matches!(
            self,
            InstructionData::Call { .. } | InstructionData::Store { .. } | InstructionData::Load { .. }
        )
    }

    pub fn result_type(&self) -> Type {
        match self {
            InstructionData::IConst { ty, .. } => *ty,
            InstructionData::FConst { ty, .. } => *ty,
            InstructionData::Binary { ty, .. } => *ty,
            InstructionData::Unary { ty, .. } => *ty,
            InstructionData::ICmp { .. } => Type::Bool,
            InstructionData::Call { ty, .. } => *ty,
            InstructionData::Load { ty, .. } => *ty,
            InstructionData::Store { .. } => Type::Void,
            InstructionData::Phi { ty, .. } => *ty,
            InstructionData::Cast { to, .. } => *to,
        }
    }
}

/// A switch case: a constant scrutinee value and its target block.
#[derive(Clone, Debug)]
pub struct SwitchCase {
    pub value: i64,
    pub target: Block,
}

/// The terminator of a basic block. Exactly one ends every reachable block.
#[derive(Clone, Debug)]
pub enum Terminator {
    /// Unconditional jump, carrying φ-selector assignments for `target`'s
    /// block parameters.
    Jump { target: Block, args: Vec<Value> },
    /// A two-way conditional branch. `guard` must be a `Type::Bool` value.
    Branch {
        guard: Value,
        then_block: Block,
        then_args: Vec<Value>,
        else_block: Block,
        else_args: Vec<Value>,
    },
    /// Lowered into an if/else-if chain over equality comparisons against
    /// `scrutinee`.
    Switch { scrutinee: Value, cases: Vec<SwitchCase>, default: Block },
    Return(Vec<Value>),
    /// Exceptional control flow (e.g. unwinding). Not modeled by the core;
    /// surfaces as `IrError::UnsupportedConstruct` for the owning function.
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> Vec<Block> {
        match self {
            Terminator::Jump { target, .. } => vec![*target],
            Terminator::Branch { then_block, else_block, .. } => vec![*then_block, *else_block],
            Terminator::Switch { cases, default, .. } => {
                let mut v: Vec<Block> = cases.iter().map(|c| c.target).collect();
                v.push(*default);
                v
            }
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }
}
