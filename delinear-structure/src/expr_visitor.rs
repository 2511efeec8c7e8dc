//! Translates IR values into AST expressions, one per SSA value, and
//! registers their provenance.
//!
//! Every [`delinear_ir::Value`] is translated exactly once and cached:
//! SSA gives each value a single definition, so re-visiting it should always
//! produce a reference to the same declared variable rather than a fresh
//! duplicate of its initializer.

use delinear_ast::{AstBuilder, BinOp, Expr, ProvenanceMap, Stmt, UnOp};
use delinear_ir::{BinaryOp, Block, CondCode, DataFlowGraph, Function, InstructionData, IntCC, Type, UnaryOp, Value, ValueDef};
use rustc_hash::FxHashMap;

fn bin_op(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::SDiv => BinOp::SDiv,
        BinaryOp::UDiv => BinOp::UDiv,
        BinaryOp::SRem => BinOp::SRem,
        BinaryOp::URem => BinOp::URem,
        BinaryOp::And => BinOp::BitAnd,
        BinaryOp::Or => BinOp::BitOr,
        BinaryOp::Xor => BinOp::BitXor,
        BinaryOp::Shl => BinOp::Shl,
        BinaryOp::ShrS => BinOp::ShrS,
        BinaryOp::ShrU => BinOp::ShrU,
    }
}

fn cmp_op(cc: IntCC) -> BinOp {
    match cc {
        IntCC::Equal => BinOp::Eq,
        IntCC::NotEqual => BinOp::Ne,
        IntCC::SignedLessThan | IntCC::UnsignedLessThan => BinOp::Lt,
        IntCC::SignedLessThanOrEqual | IntCC::UnsignedLessThanOrEqual => BinOp::Le,
        IntCC::SignedGreaterThan | IntCC::UnsignedGreaterThan => BinOp::Gt,
        IntCC::SignedGreaterThanOrEqual | IntCC::UnsignedGreaterThanOrEqual => BinOp::Ge,
    }
}

fn var_name(value: Value) -> String {
    format!("v{}", cranelift_entity::EntityRef::index(&value))
}

fn block_param_name(block: Block, index: u32) -> String {
    format!("sel_{}_{}", cranelift_entity::EntityRef::index(&block), index)
}

/// Translates IR values into expressions and non-terminator instructions
/// into statements, memoizing each SSA value's translation.
pub struct ExprVisitor<'f> {
    func: &'f Function,
    builder: &'f AstBuilder,
    cache: FxHashMap<Value, Expr>,
}

impl<'f> ExprVisitor<'f> {
    pub fn new(func: &'f Function, builder: &'f AstBuilder) -> Self {
        Self { func, builder, cache: FxHashMap::default() }
    }

    /// The expression referring to `value`'s already-declared variable.
    /// Panics if `value` has not yet been materialized by
    /// [`Self::lower_block_body`] or [`Self::lower_block_params`] -- every
    /// value must be visited before anything that reads it, which follows
    /// from SSA's dominance property plus reverse-postorder emission.
    pub fn value_expr(&self, value: Value) -> Expr {
        self.cache.get(&value).cloned().unwrap_or_else(|| {
            panic!("value {value:?} read before being materialized")
        })
    }

    /// Declares a variable for each of `block`'s parameters, without an
    /// initializer -- predecessors assign into them on the edge that enters
    /// `block`, per the φ-as-selector-variable scheme.
    pub fn lower_block_params(&mut self, block: Block, prov: &mut ProvenanceMap) {
        for (index, &value) in self.func.dfg.block_params(block).iter().enumerate() {
            let ty = self.func.dfg.value_type(value);
            let name = block_param_name(block, index as u32);
            let var = self.builder.create_var(name, ty);
            prov.set(var.id, value);
            self.cache.insert(value, var);
        }
    }

    /// Lowers every non-terminator instruction in `block` into zero or one
    /// statements, appending them to `out` in order and registering
    /// provenance for each new node.
    pub fn lower_block_body(&mut self, block: Block, out: &mut Vec<Stmt>, prov: &mut ProvenanceMap) {
        for &inst in self.func.layout.block_insts(block) {
            let data = self.func.dfg.inst_data(inst).clone();
            if let Some(stmt) = self.lower_inst(inst, &data, prov) {
                out.push(stmt);
            }
        }
    }

    /// Builds the assignment statements a predecessor emits on the edge into
    /// `target`, binding `target`'s selector variables to the values it
    /// carries across this particular edge.
    pub fn lower_edge_assignments(&mut self, target: Block, args: &[Value], prov: &mut ProvenanceMap) -> Vec<Stmt> {
        let pairs: Vec<(Value, Value)> = self
            .func
            .dfg
            .block_params(target)
            .iter()
            .zip(args.iter())
            .map(|(&param, &arg)| (param, arg))
            .collect();
        pairs
            .into_iter()
            .map(|(param, arg)| {
                let lhs = self.value_expr(param);
                let rhs = self.value_or_materialize(arg, prov);
                let rhs_id = rhs.id;
                let assign = self.builder.create_assign(lhs, rhs);
                prov.copy_provenance(rhs_id, assign.id);
                self.builder.create_expr_stmt(assign)
            })
            .collect()
    }

    fn lower_inst(&mut self, inst: delinear_ir::Inst, data: &InstructionData, prov: &mut ProvenanceMap) -> Option<Stmt> {
        let dfg: &DataFlowGraph = &self.func.dfg;
        match data {
            InstructionData::IConst { .. } | InstructionData::FConst { .. } => {
                // Constants are materialized lazily at their use sites, not as
                // standalone statements.
                None
            }
            InstructionData::Binary { .. } | InstructionData::Unary { .. } | InstructionData::ICmp { .. } | InstructionData::Cast { .. } => {
                None
            }
            InstructionData::Call { callee, ty, args } => {
                let arg_exprs: Vec<Expr> = args.iter().map(|&a| self.value_or_materialize(a, prov)).collect();
                let call = self.builder.create_call(callee.clone(), *ty, arg_exprs);
                let result = dfg.inst_result(inst);
                self.bind_result(result, call, prov)
            }
            InstructionData::Load { ty, addr } => {
                let addr_expr = self.value_or_materialize(*addr, prov);
                let load = self.builder.create_call("__load", *ty, vec![addr_expr]);
                let result = dfg.inst_result(inst);
                self.bind_result(result, load, prov)
            }
            InstructionData::Store { addr, value } => {
                let addr_expr = self.value_or_materialize(*addr, prov);
                let value_expr = self.value_or_materialize(*value, prov);
                let store = self.builder.create_call("__store", Type::Void, vec![addr_expr, value_expr]);
                prov.set(store.id, inst);
                Some(self.builder.create_expr_stmt(store))
            }
            InstructionData::Phi { ty, incoming } => {
                // Explicit phi instructions (as opposed to block parameters)
                // are materialized the same way: a selector variable with no
                // initializer here, assigned by each listed predecessor.
                let _ = incoming;
                let name = format!("phi{}", cranelift_entity::EntityRef::index(&inst));
                let decl = self.builder.create_decl(name.clone(), *ty, None);
                prov.set(decl.id, inst);
                let var = self.builder.create_var(name, *ty);
                let result = dfg.inst_result(inst);
                if let Some(value) = result {
                    prov.set(var.id, value);
                    self.cache.insert(value, var);
                }
                Some(decl)
            }
        }
    }

    fn bind_result(&mut self, result: Option<Value>, init: Expr, prov: &mut ProvenanceMap) -> Option<Stmt> {
        let value = result?;
        let name = var_name(value);
        let ty = init.ty;
        let decl = self.builder.create_decl(name.clone(), ty, Some(init));
        prov.set(decl.id, value);
        let var = self.builder.create_var(name, ty);
        prov.set(var.id, value);
        self.cache.insert(value, var);
        Some(decl)
    }

    /// Pure values (constants, arithmetic, comparisons, casts) are expanded
    /// inline at each use rather than given their own declaration, since they
    /// have no side effect to sequence and inlining keeps the output
    /// readable; only side-effecting instructions get `bind_result`.
    fn value_or_materialize(&mut self, value: Value, prov: &mut ProvenanceMap) -> Expr {
        if let Some(cached) = self.cache.get(&value) {
            return cached.clone();
        }
        let expr = match self.func.dfg.value_def(value).clone() {
            ValueDef::Argument(index, ty) => self.builder.create_var(format!("arg{index}"), ty),
            ValueDef::Param(block, index) => self.builder.create_var(block_param_name(block, index), self.func.dfg.value_type(value)),
            ValueDef::Result(inst) => self.materialize_pure(inst, prov),
        };
        prov.set(expr.id, value);
        self.cache.insert(value, expr.clone());
        expr
    }

    fn materialize_pure(&mut self, inst: delinear_ir::Inst, prov: &mut ProvenanceMap) -> Expr {
        let data = self.func.dfg.inst_data(inst).clone();
        match data {
            InstructionData::IConst { ty, value } => self.builder.create_int_lit(ty, value),
            InstructionData::FConst { ty, bits } => self.builder.create_float_lit(ty, f64::from_bits(bits)),
            InstructionData::Binary { op, ty, lhs, rhs } => {
                let lhs = self.value_or_materialize(lhs, prov);
                let rhs = self.value_or_materialize(rhs, prov);
                self.builder.create_binary(bin_op(op), ty, lhs, rhs)
            }
            InstructionData::Unary { op, ty, arg } => {
                let arg = self.value_or_materialize(arg, prov);
                match op {
                    UnaryOp::BoolNot => self.builder.create_lnot(arg),
                    UnaryOp::Neg => self.builder.create_unary(UnOp::Neg, ty, arg),
                    UnaryOp::Not => self.builder.create_unary(UnOp::BitNot, ty, arg),
                }
            }
            InstructionData::ICmp { cc, lhs, rhs } => {
                let lhs = self.value_or_materialize(lhs, prov);
                let rhs = self.value_or_materialize(rhs, prov);
                self.builder.create_comparison(cmp_op(cc), lhs, rhs)
            }
            InstructionData::Cast { to, arg, .. } => {
                let arg = self.value_or_materialize(arg, prov);
                self.builder.create_cast(to, arg)
            }
            other => unreachable!("materialize_pure called on side-effecting instruction {other:?}"),
        }
    }

    /// The guard for a conditional edge: `value` as-is for the true branch,
    /// its logical negation (via `CreateLNot`, preserving provenance) for
    /// the false branch.
    pub fn guard_expr(&mut self, value: Value, negate: bool, prov: &mut ProvenanceMap) -> Expr {
        let base = self.value_or_materialize(value, prov);
        if !negate {
            return base;
        }
        let base_id = base.id;
        let negated = self.builder.create_lnot(base);
        prov.copy_provenance(base_id, negated.id);
        negated
    }
}
