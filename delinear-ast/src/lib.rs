//! AST node types, the builder (C2), the provenance map (C1), and a
//! traversal helper shared by the refinement passes.

pub mod builder;
pub mod decl;
pub mod expr;
pub mod node_id;
pub mod provenance;
pub mod stmt;
pub mod walk;

pub use builder::AstBuilder;
pub use decl::{Decl, DeclKind, Param, TranslationUnit};
pub use expr::{BinOp, Expr, ExprKind, UnOp};
pub use node_id::NodeId;
pub use provenance::ProvenanceMap;
pub use stmt::{Stmt, StmtKind};
