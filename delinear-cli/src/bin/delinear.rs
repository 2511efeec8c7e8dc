//! `delinear`: reads an IR module, structures and refines every function,
//! and prints the result as C (§6 External Interfaces).
//!
//! Mirrors the teacher's `wasmtime-cli` split: a thin `main` that resolves
//! configuration, installs logging, and hands off to the library crate for
//! everything else. Exit code is 0 on success, non-zero (via `anyhow`'s
//! `Result`-returning `main`) on any fatal error.

use std::fs;

use anyhow::Context;
use clap::Parser;
use delinear_cli::{print_translation_unit, run_pipeline, Cli, Config};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose);

    let config = Config::resolve(cli)?;
    let module = delinear_cli::ir_loader::load_module(&config.input)
        .with_context(|| format!("loading IR module from {}", config.input.display()))?;

    let output = run_pipeline(&module, &config)?;

    for (name, _) in &output.unstructured {
        tracing::debug!(function = %name, "emitted unstructured AST dump");
    }
    if !output.unstructured.is_empty() {
        let path = unstructured_path(&config.output);
        let dump: String = output
            .unstructured
            .iter()
            .map(|(name, text)| format!("// {name}\n{text}\n"))
            .collect();
        fs::write(&path, dump).with_context(|| format!("writing {}", path.display()))?;
    }

    for diag in &output.diagnostics {
        tracing::info!(
            function = %diag.function,
            loops = diag.loop_shapes.len(),
            idempotent = diag.idempotent,
            "function refined"
        );
        if !diag.idempotent {
            tracing::warn!(function = %diag.function, "final phase is not idempotent on its own output");
        }
    }

    let text = print_translation_unit(&output.unit);
    fs::write(&config.output, text).with_context(|| format!("writing {}", config.output.display()))?;

    Ok(())
}

fn unstructured_path(output: &std::path::Path) -> std::path::PathBuf {
    let mut s = output.as_os_str().to_owned();
    s.push(".unstructured");
    s.into()
}

/// `RUST_LOG` wins when set (the teacher's convention); otherwise `-v`/`-vv`
/// steps through warn -> info -> debug -> trace.
fn install_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
