//! A single function: signature, data-flow graph, and block layout.

use crate::dfg::DataFlowGraph;
use crate::entities::Block;
use crate::layout::Layout;
use crate::types::Type;

#[derive(Clone, Debug)]
pub struct Signature {
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

pub struct Function {
    pub name: String,
    pub signature: Signature,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
}

impl Function {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            dfg: DataFlowGraph::new(),
            layout: Layout::new(),
        }
    }

    pub fn entry_block(&self) -> Block {
        self.layout.entry_block()
    }
}
