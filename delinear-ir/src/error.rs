//! Error kinds owned by the IR crate: the errors the IR layer itself can
//! raise. Loading bitcode into a `Module` is out of scope for this crate;
//! `LoadError` exists here only as the contract an external loader is
//! expected to report through.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrError {
    #[error("failed to load IR module: {0}")]
    LoadError(String),

    #[error("unsupported construct in function `{function}`: {detail}")]
    UnsupportedConstruct { function: String, detail: String },
}
