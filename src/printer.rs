//! The external printer (§6: "rendered as text by an external printer"):
//! turns a [`TranslationUnit`] into C-family source text.
//!
//! Not part of the core -- the core's job ends at a refined AST. This is
//! the thinnest possible renderer that makes the pipeline's output
//! actually readable and (spot-check only; §8 Testable Property 6 is not
//! exercised by this repo's test suite) plausibly compilable.

use delinear_ast::{BinOp, Decl, DeclKind, Expr, ExprKind, Stmt, StmtKind, TranslationUnit, UnOp};
use delinear_ir::Type;

pub fn print_translation_unit(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    for decl in &unit.decls {
        print_decl(decl, &mut out);
        out.push('\n');
    }
    out
}

fn print_decl(decl: &Decl, out: &mut String) {
    match &decl.kind {
        DeclKind::Function { name, params, return_ty, body } => {
            let param_list = params.iter().map(|p| format!("{} {}", c_type(p.ty), p.name)).collect::<Vec<_>>().join(", ");
            out.push_str(&format!("{} {}({}) ", c_type(*return_ty), name, param_list));
            print_stmt(body, 0, out);
            out.push('\n');
        }
        DeclKind::Variable { name, ty, init } => {
            out.push_str(&format!("{} {}", c_type(*ty), name));
            if let Some(e) = init {
                out.push_str(" = ");
                print_expr(e, out);
            }
            out.push_str(";\n");
        }
    }
}

/// Renders a bare statement tree without a surrounding declaration, for
/// callers (the idempotence check in `diagnostics`) that only need to
/// compare two AST snapshots textually -- `Stmt`/`Expr` carry no
/// `PartialEq`, so string comparison stands in for structural equality.
pub fn print_stmt_standalone(stmt: &Stmt) -> String {
    let mut out = String::new();
    print_stmt(stmt, 0, &mut out);
    out
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

fn print_stmt(stmt: &Stmt, level: usize, out: &mut String) {
    match &stmt.kind {
        StmtKind::Compound(stmts) => {
            out.push_str("{\n");
            for s in stmts {
                indent(level + 1, out);
                print_stmt(s, level + 1, out);
                out.push('\n');
            }
            indent(level, out);
            out.push('}');
        }
        StmtKind::Decl { name, ty, init } => {
            out.push_str(&format!("{} {}", c_type(*ty), name));
            if let Some(e) = init {
                out.push_str(" = ");
                print_expr(e, out);
            }
            out.push(';');
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            out.push_str("if (");
            print_expr(cond, out);
            out.push_str(") ");
            print_stmt(then_branch, level, out);
            if let Some(e) = else_branch {
                out.push_str(" else ");
                print_stmt(e, level, out);
            }
        }
        StmtKind::While { cond, body } => {
            out.push_str("while (");
            print_expr(cond, out);
            out.push_str(") ");
            print_stmt(body, level, out);
        }
        StmtKind::DoWhile { body, cond } => {
            out.push_str("do ");
            print_stmt(body, level, out);
            out.push_str(" while (");
            print_expr(cond, out);
            out.push_str(");");
        }
        StmtKind::Break => out.push_str("break;"),
        StmtKind::Return(value) => {
            out.push_str("return");
            if let Some(e) = value {
                out.push(' ');
                print_expr(e, out);
            }
            out.push(';');
        }
        StmtKind::ExprStmt(e) => {
            print_expr(e, out);
            out.push(';');
        }
        StmtKind::Null => out.push(';'),
    }
}

fn print_expr(expr: &Expr, out: &mut String) {
    match &expr.kind {
        ExprKind::IntLit(v) => out.push_str(&v.to_string()),
        ExprKind::FloatLit(v) => out.push_str(&format!("{v}")),
        ExprKind::BoolLit(v) => out.push_str(if *v { "true" } else { "false" }),
        ExprKind::Var(name) => out.push_str(name),
        ExprKind::Unary { op, operand } => {
            out.push_str(unop_str(*op));
            out.push('(');
            print_expr(operand, out);
            out.push(')');
        }
        ExprKind::Binary { op, lhs, rhs } => {
            out.push('(');
            print_expr(lhs, out);
            out.push_str(&format!(" {} ", binop_str(*op)));
            print_expr(rhs, out);
            out.push(')');
        }
        ExprKind::Cast { to, expr } => {
            out.push_str(&format!("({})", c_type(*to)));
            print_expr(expr, out);
        }
        ExprKind::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(a, out);
            }
            out.push(')');
        }
        ExprKind::Member { base, field } => {
            print_expr(base, out);
            out.push('.');
            out.push_str(field);
        }
        ExprKind::Index { base, index } => {
            print_expr(base, out);
            out.push('[');
            print_expr(index, out);
            out.push(']');
        }
        ExprKind::Paren(e) => {
            out.push('(');
            print_expr(e, out);
            out.push(')');
        }
        ExprKind::Assign { lhs, rhs } => {
            print_expr(lhs, out);
            out.push_str(" = ");
            print_expr(rhs, out);
        }
    }
}

fn unop_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::BitNot => "~",
        UnOp::LNot => "!",
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::SDiv | BinOp::UDiv => "/",
        BinOp::SRem | BinOp::URem => "%",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::ShrS | BinOp::ShrU => ">>",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::LAnd => "&&",
        BinOp::LOr => "||",
    }
}

fn c_type(ty: Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::I8 => "int8_t",
        Type::I16 => "int16_t",
        Type::I32 => "int32_t",
        Type::I64 => "int64_t",
        Type::F32 => "float",
        Type::F64 => "double",
        Type::Ptr => "void*",
        Type::Void => "void",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delinear_ast::{AstBuilder, Param};

    #[test]
    fn prints_a_trivial_function() {
        let builder = AstBuilder::new();
        let body = builder.create_compound_stmt(vec![builder.create_return(Some(builder.create_int_lit(Type::I32, 42)))]);
        let decl = Decl {
            id: builder.fresh_id(),
            kind: DeclKind::Function {
                name: "answer".into(),
                params: vec![Param { name: "arg0".into(), ty: Type::I32 }],
                return_ty: Type::I32,
                body,
            },
        };
        let unit = TranslationUnit { id: builder.fresh_id(), decls: vec![decl] };
        let text = print_translation_unit(&unit);
        assert!(text.contains("int32_t answer(int32_t arg0)"));
        assert!(text.contains("return 42;"));
    }
}
