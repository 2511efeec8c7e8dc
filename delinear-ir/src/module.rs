//! An IR module: an ordered sequence of functions.

use crate::function::Function;

#[derive(Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }
}
