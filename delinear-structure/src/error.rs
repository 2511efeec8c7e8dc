//! Error kinds owned by the structuralizer: §7 error kind 2
//! (`UnsupportedConstruct`). Fatal only for the affected function; the
//! pass manager's caller skips it and continues with the rest of the
//! module, per §5/§7's propagation policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("unsupported construct in function `{function}`: {detail}")]
    UnsupportedConstruct { function: String, detail: String },
}
