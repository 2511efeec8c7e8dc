//! The data-flow side of a function: value definitions and instruction data.
//!
//! Split from [`crate::layout::Layout`]: the DFG answers "what is this
//! value/instruction", the layout answers "where does it sit in block
//! order".

use crate::entities::{Block, Inst, Value};
use crate::instructions::{InstructionData, Terminator};
use crate::types::Type;
use cranelift_entity::{PrimaryMap, SecondaryMap};

/// What a [`Value`] is bound to.
#[derive(Clone, Debug)]
pub enum ValueDef {
    /// The (only) result of an instruction.
    Result(Inst),
    /// A block parameter, standing in for a φ-node's selector value at
    /// `block`'s head.
    Param(Block, u32),
    /// A function argument.
    Argument(u32, Type),
}

#[derive(Default)]
pub struct DataFlowGraph {
    values: PrimaryMap<Value, ValueDef>,
    value_types: SecondaryMap<Value, PackedType>,
    insts: PrimaryMap<Inst, InstructionData>,
    /// Terminators live outside `insts` since every block has exactly one
    /// and it is never a DCE/rewrite candidate like a regular instruction.
    terminators: SecondaryMap<Block, Option<Terminator>>,
    block_params: SecondaryMap<Block, Vec<Value>>,
    inst_results: SecondaryMap<Inst, PackedValue>,
}

/// `SecondaryMap` needs a `Default`-able fill value; `Type` doesn't have a
/// meaningless default, so wrap it.
#[derive(Clone, Copy, Default)]
struct PackedType(Option<Type>);

#[derive(Clone, Copy, Default)]
struct PackedValue(Option<Value>);

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_inst(&mut self, data: InstructionData) -> Inst {
        self.insts.push(data)
    }

    pub fn inst_data(&self, inst: Inst) -> &InstructionData {
        &self.insts[inst]
    }

    /// Binds `value` as the result of `inst`, recording its type for quick
    /// lookup without re-walking `inst_data`.
    pub fn make_inst_result(&mut self, inst: Inst, ty: Type) -> Value {
        let v = self.values.push(ValueDef::Result(inst));
        self.value_types[v] = PackedType(Some(ty));
        self.inst_results[inst] = PackedValue(Some(v));
        v
    }

    /// The value bound to `inst`'s result, if it produces one.
    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.inst_results[inst].0
    }

    pub fn make_block_param(&mut self, block: Block, ty: Type) -> Value {
        let index = self.block_params[block].len() as u32;
        let v = self.values.push(ValueDef::Param(block, index));
        self.value_types[v] = PackedType(Some(ty));
        self.block_params[block].push(v);
        v
    }

    pub fn make_argument(&mut self, index: u32, ty: Type) -> Value {
        let v = self.values.push(ValueDef::Argument(index, ty));
        self.value_types[v] = PackedType(Some(ty));
        v
    }

    pub fn value_def(&self, value: Value) -> &ValueDef {
        &self.values[value]
    }

    pub fn value_type(&self, value: Value) -> Type {
        self.value_types[value]
            .0
            .expect("value queried before its type was recorded")
    }

    pub fn block_params(&self, block: Block) -> &[Value] {
        &self.block_params[block]
    }

    pub fn set_terminator(&mut self, block: Block, term: Terminator) {
        self.terminators[block] = Some(term);
    }

    pub fn terminator(&self, block: Block) -> Option<&Terminator> {
        self.terminators[block].as_ref()
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Every value read by `inst`. This IR has no alias analysis, so this is
    /// just a pass-through to the instruction's own operand list -- kept as
    /// a method so callers don't need to know that.
    pub fn inst_args(&self, inst: Inst) -> Vec<Value> {
        self.insts[inst].args()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{BinaryOp, InstructionData};

    #[test]
    fn result_type_round_trips() {
        let mut dfg = DataFlowGraph::new();
        let inst = dfg.make_inst(InstructionData::IConst { ty: Type::I32, value: 1 });
        let v = dfg.make_inst_result(inst, Type::I32);
        assert_eq!(dfg.value_type(v), Type::I32);
        assert!(matches!(dfg.value_def(v), ValueDef::Result(i) if *i == inst));

        let add = dfg.make_inst(InstructionData::Binary {
            op: BinaryOp::Add,
            ty: Type::I32,
            lhs: v,
            rhs: v,
        });
        assert_eq!(dfg.inst_args(add), vec![v, v]);
    }
}
