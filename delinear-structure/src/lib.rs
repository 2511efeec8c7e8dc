//! Turns a function's control-flow graph into an initial, well-formed AST
//! (C4): control-flow analysis (dominators, natural loops), reaching
//! conditions, and the structuralizer that emits `if`/`while`/`break` from
//! them.

pub mod cfg;
pub mod dominator_tree;
pub mod edges;
pub mod error;
pub mod expr_visitor;
pub mod loops;
pub mod reaching_conditions;
pub mod structuralizer;

pub use cfg::ControlFlowGraph;
pub use dominator_tree::DominatorTree;
pub use error::StructureError;
pub use expr_visitor::ExprVisitor;
pub use loops::LoopForest;
pub use reaching_conditions::ReachingConditions;
pub use structuralizer::structure_function;
