//! `delinear`: a reaching-conditions IR-to-C decompiler (§6).
//!
//! This crate is the CLI's supporting library: it owns everything upstream
//! and downstream of the core (`delinear-ir`/`delinear-ast`/
//! `delinear-structure`/`delinear-smt`/`delinear-passes`) that the core
//! itself deliberately leaves to "external collaborators" -- the IR loader,
//! the C printer, CLI configuration, and per-run diagnostics. The binary at
//! `delinear-cli/src/bin/delinear.rs` is a thin wrapper around
//! [`pipeline::run_pipeline`].

pub mod config;
pub mod diagnostics;
pub mod ir_loader;
pub mod pipeline;
pub mod printer;

pub use config::{Cli, Config};
pub use diagnostics::FunctionDiagnostic;
pub use pipeline::{run_pipeline, PipelineOutput};
pub use printer::print_translation_unit;
