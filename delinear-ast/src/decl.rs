//! Declaration nodes: the top two levels of the output AST.

use crate::node_id::NodeId;
use crate::stmt::Stmt;
use delinear_ir::Type;

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub enum DeclKind {
    Function { name: String, params: Vec<Param>, return_ty: Type, body: Stmt },
    Variable { name: String, ty: Type, init: Option<crate::expr::Expr> },
}

#[derive(Clone, Debug)]
pub struct Decl {
    pub id: NodeId,
    pub kind: DeclKind,
}

/// The translation-unit root: the printer's single entry point.
#[derive(Clone, Debug)]
pub struct TranslationUnit {
    pub id: NodeId,
    pub decls: Vec<Decl>,
}
