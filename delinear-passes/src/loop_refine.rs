//! Loop refinement (§4.7).
//!
//! Applies the first matching rule, in the order listed in §4.7, to every
//! `while (true) { .. }` in the AST. §9 Design Notes model each rule as a
//! variant of one tagged enum with a `try_apply` operation dispatched on
//! the tag, rather than a `match`/`substitute` virtual-method hierarchy.

use delinear_ast::{AstBuilder, Expr, ProvenanceMap, Stmt, StmtKind};

use crate::pass::{Pass, PassContext};

pub struct LoopRefine;

impl Pass for LoopRefine {
    fn name(&self) -> &'static str {
        "loop-refine"
    }

    fn run(&mut self, body: &mut Stmt, ctx: &mut PassContext) -> bool {
        refine(body, ctx)
    }
}

fn refine(stmt: &mut Stmt, ctx: &mut PassContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::While { cond, body } if cond.is_true_literal() => {
            let stmts = as_stmt_list(body);
            if let Some(replacement) = try_rules(&stmts, ctx.builder, ctx.prov) {
                *stmt = replacement;
                changed = true;
                changed |= refine(stmt, ctx);
                return changed;
            }
            changed |= refine(body, ctx);
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= refine(body, ctx);
        }
        StmtKind::Compound(stmts) => {
            for s in stmts.iter_mut() {
                changed |= refine(s, ctx);
            }
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            changed |= refine(then_branch, ctx);
            if let Some(e) = else_branch {
                changed |= refine(e, ctx);
            }
        }
        StmtKind::Decl { .. } | StmtKind::Break | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => {}
    }
    changed
}

#[derive(Copy, Clone)]
enum LoopRule {
    CondToSeq,
    CondToSeqNeg,
    NestedDoWhile,
    LoopToSeq,
    WhileRule,
    DoWhileRule,
}

const RULES_IN_ORDER: [LoopRule; 6] = [
    LoopRule::CondToSeq,
    LoopRule::CondToSeqNeg,
    LoopRule::NestedDoWhile,
    LoopRule::LoopToSeq,
    LoopRule::WhileRule,
    LoopRule::DoWhileRule,
];

fn try_rules(stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Stmt> {
    for rule in RULES_IN_ORDER {
        if let Some(replacement) = rule.try_apply(stmts, builder, prov) {
            return Some(replacement);
        }
    }
    None
}

impl LoopRule {
    fn try_apply(self, stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Stmt> {
        match self {
            LoopRule::CondToSeq => cond_to_seq(stmts, builder, prov, false),
            LoopRule::CondToSeqNeg => cond_to_seq(stmts, builder, prov, true),
            LoopRule::NestedDoWhile => nested_do_while(stmts, builder, prov),
            LoopRule::LoopToSeq => loop_to_seq(stmts, builder, prov),
            LoopRule::WhileRule => while_rule(stmts, builder, prov),
            LoopRule::DoWhileRule => do_while_rule(stmts, builder, prov),
        }
    }
}

/// `CondToSeq`/`CondToSeqNeg`: body is a single `if (C) T else E`, with the
/// break confined to exactly one arm. `negated == false` means the break
/// is in `E` (`while (C) T; then E`); `negated == true` means it's in `T`
/// (`while (!C) E; then T`).
fn cond_to_seq(stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap, negated: bool) -> Option<Stmt> {
    let [only] = stmts else { return None };
    let StmtKind::If { cond, then_branch, else_branch: Some(else_branch) } = &only.kind else {
        return None;
    };
    let (break_arm, loop_arm) = if negated { (then_branch.as_ref(), else_branch.as_ref()) } else { (else_branch.as_ref(), then_branch.as_ref()) };
    if break_arm.own_break_count() != 1 || loop_arm.own_break_count() != 0 {
        return None;
    }
    let loop_cond = if negated { negate(cond, builder, prov) } else { cond.clone() };
    let while_loop = builder.create_while(loop_cond, loop_arm.clone());
    let tail = strip_break(break_arm, builder);
    Some(builder.create_compound_stmt(vec![while_loop, tail]))
}

/// `NestedDoWhileRule`: a tail `if (C) { break; } else E` with a non-empty
/// `E`, refusing the match outright if more than one tail-shaped candidate
/// exists in the body (§9 open question (a): preserves the source's
/// "second match is refused" behavior).
fn nested_do_while(stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Stmt> {
    let candidates: Vec<usize> = stmts
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(&s.kind, StmtKind::If { then_branch, else_branch: Some(e), .. } if is_pure_break(then_branch, builder) && !e.is_effectively_empty()))
        .map(|(i, _)| i)
        .collect();
    if candidates.len() != 1 {
        return None;
    }
    let last = stmts.len() - 1;
    let idx = candidates[0];
    if idx != last {
        return None;
    }
    let StmtKind::If { cond, else_branch: Some(e), .. } = &stmts[last].kind else {
        unreachable!("filtered above")
    };
    let not_cond = negate(cond, builder, prov);
    let mut prefix: Vec<Stmt> = stmts[..last].to_vec();
    prefix.push((**e).clone());
    Some(builder.create_do(builder.create_compound_stmt(prefix), not_cond))
}

/// `LoopToSeq`: every path through the body leads to `break`, so the loop
/// never actually repeats; drop the wrapper and strip the now-redundant
/// breaks.
fn loop_to_seq(stmts: &[Stmt], builder: &AstBuilder, _prov: &mut ProvenanceMap) -> Option<Stmt> {
    if !always_breaks(stmts) {
        return None;
    }
    let stripped: Vec<Stmt> = stmts.iter().map(|s| strip_break(s, builder)).collect();
    Some(builder.create_compound_stmt(stripped))
}

/// `WhileRule`: body begins with `if (C) { break; } else E` followed by
/// more code -- rewrite as `while (!C) { E; rest }`.
fn while_rule(stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Stmt> {
    let (first, rest) = stmts.split_first()?;
    let StmtKind::If { cond, then_branch, else_branch } = &first.kind else {
        return None;
    };
    if !is_pure_break(then_branch, builder) {
        return None;
    }
    let not_cond = negate(cond, builder, prov);
    let mut body = match else_branch {
        Some(e) => as_stmt_list(e),
        None => vec![],
    };
    body.extend(rest.iter().cloned());
    Some(builder.create_while(not_cond, builder.create_compound_stmt(body)))
}

/// `DoWhileRule`: body ends with `if (C) { break; }` with no `else` --
/// rewrite as `do { prefix } while (!C);`.
fn do_while_rule(stmts: &[Stmt], builder: &AstBuilder, prov: &mut ProvenanceMap) -> Option<Stmt> {
    let (last, prefix) = stmts.split_last()?;
    let StmtKind::If { cond, then_branch, else_branch: None } = &last.kind else {
        return None;
    };
    if !is_pure_break(then_branch, builder) {
        return None;
    }
    let not_cond = negate(cond, builder, prov);
    Some(builder.create_do(builder.create_compound_stmt(prefix.to_vec()), not_cond))
}

fn negate(cond: &Expr, builder: &AstBuilder, prov: &mut ProvenanceMap) -> Expr {
    let negated = builder.create_lnot(cond.clone());
    prov.copy_provenance(cond.id, negated.id);
    negated
}

fn as_stmt_list(stmt: &Stmt) -> Vec<Stmt> {
    match &stmt.kind {
        StmtKind::Compound(stmts) => stmts.clone(),
        _ => vec![stmt.clone()],
    }
}

/// True when `stmt` contains exactly one `break` (not nested in an inner
/// loop) and nothing else of consequence -- i.e. it reduces to `Null` once
/// that break is stripped.
fn is_pure_break(stmt: &Stmt, builder: &AstBuilder) -> bool {
    stmt.own_break_count() == 1 && strip_break(stmt, builder).is_effectively_empty()
}

/// Replaces the (unique, per the `own_break_count() <= 1` side condition
/// every caller checks first) `break` reachable from `stmt` with `Null`,
/// without descending into nested loops.
fn strip_break(stmt: &Stmt, builder: &AstBuilder) -> Stmt {
    match &stmt.kind {
        StmtKind::Break => builder.create_null(),
        StmtKind::Compound(stmts) => builder.create_compound_stmt(stmts.iter().map(|s| strip_break(s, builder)).collect()),
        StmtKind::If { cond, then_branch, else_branch } => builder.create_if(
            cond.clone(),
            strip_break(then_branch, builder),
            else_branch.as_ref().map(|e| strip_break(e, builder)),
        ),
        StmtKind::While { .. } | StmtKind::DoWhile { .. } => stmt.clone(),
        StmtKind::Decl { .. } | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => stmt.clone(),
    }
}

/// True when control can never fall off the end of `stmts` without
/// reaching a `break` first, i.e. the loop this body belongs to never
/// actually repeats.
fn always_breaks(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_always_breaks)
}

fn stmt_always_breaks(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Break => true,
        StmtKind::Compound(stmts) => always_breaks(stmts),
        StmtKind::If { then_branch, else_branch: Some(e), .. } => stmt_always_breaks(then_branch) && stmt_always_breaks(e),
        StmtKind::If { else_branch: None, .. } => false,
        StmtKind::While { .. } | StmtKind::DoWhile { .. } | StmtKind::Decl { .. } | StmtKind::Return(_) | StmtKind::ExprStmt(_) | StmtKind::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, BinOp, ExprKind, ProvenanceMap};
    use delinear_ir::Type;
    use delinear_smt::ConditionSimplifier;

    fn ctx<'a>(builder: &'a AstBuilder, prov: &'a mut ProvenanceMap, simplifier: &'a mut ConditionSimplifier) -> PassContext<'a> {
        PassContext { builder, prov, simplifier, function_name: "t" }
    }

    #[test]
    fn s1_cond_to_seq_neg() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let x = builder.create_var("x", Type::I32);
        let zero = builder.create_int_lit(Type::I32, 0);
        let cmp = builder.create_comparison(BinOp::Eq, x, zero);
        let brk = builder.create_break();
        let y = builder.create_var("y", Type::I32);
        let one = builder.create_int_lit(Type::I32, 1);
        let incr = builder.create_assign(y.clone(), builder.create_binary(BinOp::Add, Type::I32, y, one));
        let else_branch = builder.create_expr_stmt(incr);
        let if_stmt = builder.create_if(cmp, brk, Some(else_branch));
        let mut loop_stmt = builder.create_while(builder.create_bool_lit(true), if_stmt);

        let mut pass = LoopRefine;
        let mut c = ctx(&builder, &mut prov, &mut simp);
        assert!(pass.run(&mut loop_stmt, &mut c));

        match loop_stmt.kind {
            StmtKind::Compound(stmts) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(&stmts[0].kind, StmtKind::While { cond, .. } if matches!(&cond.kind, ExprKind::Unary { .. })));
                assert!(stmts[1].is_effectively_empty());
            }
            other => panic!("expected [while, empty-tail], got {other:?}"),
        }
    }

    #[test]
    fn s2_do_while_rule() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let y = builder.create_var("y", Type::I32);
        let one = builder.create_int_lit(Type::I32, 1);
        let incr = builder.create_assign(y.clone(), builder.create_binary(BinOp::Add, Type::I32, y, one));
        let incr_stmt = builder.create_expr_stmt(incr);
        let x = builder.create_var("x", Type::I32);
        let zero = builder.create_int_lit(Type::I32, 0);
        let cmp = builder.create_comparison(BinOp::Eq, x, zero);
        let brk = builder.create_break();
        let check = builder.create_if(cmp, brk, None);
        let body = builder.create_compound_stmt(vec![incr_stmt, check]);
        let mut loop_stmt = builder.create_while(builder.create_bool_lit(true), body);

        let mut pass = LoopRefine;
        let mut c = ctx(&builder, &mut prov, &mut simp);
        assert!(pass.run(&mut loop_stmt, &mut c));

        match &loop_stmt.kind {
            StmtKind::DoWhile { body, cond } => {
                assert!(matches!(&cond.kind, ExprKind::Unary { .. }));
                assert!(matches!(&body.kind, StmtKind::Compound(s) if s.len() == 1));
            }
            other => panic!("expected do-while, got {other:?}"),
        }
    }

    #[test]
    fn s5_loop_to_seq() {
        let builder = AstBuilder::new();
        let mut prov = ProvenanceMap::new();
        let mut simp = ConditionSimplifier::for_condition_based_refinement(1000);

        let s1 = builder.create_expr_stmt(builder.create_call("s1", Type::Void, vec![]));
        let c = builder.create_var("c", Type::Bool);
        let t = builder.create_expr_stmt(builder.create_call("t", Type::Void, vec![]));
        let e = builder.create_expr_stmt(builder.create_call("e", Type::Void, vec![]));
        let then_arm = builder.create_compound_stmt(vec![t, builder.create_break()]);
        let else_arm = builder.create_compound_stmt(vec![e, builder.create_break()]);
        let if_stmt = builder.create_if(c, then_arm, Some(else_arm));
        let body = builder.create_compound_stmt(vec![s1, if_stmt]);
        let mut loop_stmt = builder.create_while(builder.create_bool_lit(true), body);

        let mut pass = LoopRefine;
        let mut ctx_ = ctx(&builder, &mut prov, &mut simp);
        assert!(pass.run(&mut loop_stmt, &mut ctx_));

        match &loop_stmt.kind {
            StmtKind::Compound(stmts) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(stmts[1].kind, StmtKind::If { else_branch: Some(_), .. }));
            }
            other => panic!("expected flattened sequence, got {other:?}"),
        }
    }
}
