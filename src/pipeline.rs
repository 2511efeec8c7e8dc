//! Drives one loaded [`Module`] through C4 structuralization and C8
//! refinement, function by function, and assembles the results into a
//! printable [`TranslationUnit`].
//!
//! Error propagation follows §7/SPEC_FULL §10.2: a `StructureError`
//! (`UnsupportedConstruct`) is recoverable at the module level -- log it,
//! skip that one function, keep going -- while a `RefineError` is fatal to
//! the whole run and aborts via `anyhow::Error` at this boundary.

use anyhow::Context as _;
use delinear_ast::{AstBuilder, Decl, DeclKind, Param, ProvenanceMap, TranslationUnit};
use delinear_ir::{Module, Type};
use delinear_passes::PassManager;
use delinear_smt::{DEFAULT_TACTICS_CBR, DEFAULT_TACTICS_FINAL};

use crate::config::Config;
use crate::diagnostics::{self, FunctionDiagnostic};
use crate::printer::print_stmt_standalone;

pub struct PipelineOutput {
    pub unit: TranslationUnit,
    pub diagnostics: Vec<FunctionDiagnostic>,
    /// One `function_name -> unstructured AST text` entry per function,
    /// populated only when `--emit-unstructured` is set.
    pub unstructured: Vec<(String, String)>,
}

pub fn run_pipeline(module: &Module, config: &Config) -> anyhow::Result<PipelineOutput> {
    let builder = AstBuilder::new();
    let mut prov = ProvenanceMap::new();
    let manager = PassManager::with_tactics(
        config.smt_timeout_ms,
        config.smt_tactics_cbr.clone().unwrap_or_else(|| DEFAULT_TACTICS_CBR.to_string()),
        config.smt_tactics_final.clone().unwrap_or_else(|| DEFAULT_TACTICS_FINAL.to_string()),
    );

    let mut decls = Vec::new();
    let mut diags = Vec::new();
    let mut unstructured = Vec::new();

    for func in &module.functions {
        let unstructured_body = match delinear_structure::structure_function(func, &builder, &mut prov) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(function = %func.name, error = %e, "skipping function: unsupported construct");
                continue;
            }
        };

        if config.emit_unstructured {
            unstructured.push((func.name.clone(), print_stmt_standalone(&unstructured_body)));
        }

        let refined = manager
            .run(unstructured_body, &builder, &mut prov, &func.name)
            .with_context(|| format!("refining function `{}`", func.name))?;

        let diagnostic = diagnostics::diagnose(&func.name, &refined, &manager, &builder, &mut prov)
            .with_context(|| format!("checking idempotence of function `{}`", func.name))?;
        diags.push(diagnostic);

        let params = func
            .signature
            .params
            .iter()
            .enumerate()
            .map(|(i, &ty)| Param { name: format!("arg{i}"), ty })
            .collect();
        let return_ty = func.signature.returns.first().copied().unwrap_or(Type::Void);

        decls.push(Decl {
            id: builder.fresh_id(),
            kind: DeclKind::Function { name: func.name.clone(), params, return_ty, body: refined },
        });
    }

    let unit = TranslationUnit { id: builder.fresh_id(), decls };
    Ok(PipelineOutput { unit, diagnostics: diags, unstructured })
}
