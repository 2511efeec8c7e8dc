//! §6 EXTERNAL INTERFACES' configuration surface, plus §10.3's
//! `--config <toml>` escape hatch (file values fill in anything not given
//! on the command line).

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// Default matches §6 exactly: `smt_timeout_ms` = 10000.
pub const DEFAULT_SMT_TIMEOUT_MS: u32 = 10_000;

#[derive(Parser, Debug)]
#[command(name = "delinear", version, about = "Reaching-conditions IR-to-C decompiler")]
pub struct Cli {
    /// Source IR module (delinear's TOML interchange format).
    #[arg(long = "input")]
    pub input: PathBuf,

    /// Destination C source file.
    #[arg(long = "output")]
    pub output: PathBuf,

    /// Per-call SMT solver timeout, in milliseconds.
    #[arg(long = "smt-timeout-ms")]
    pub smt_timeout_ms: Option<u32>,

    /// Override the condition-based-refinement phase's tactic pipeline.
    #[arg(long = "smt-tactics-cbr")]
    pub smt_tactics_cbr: Option<String>,

    /// Override the final phase's tactic pipeline.
    #[arg(long = "smt-tactics-final")]
    pub smt_tactics_final: Option<String>,

    /// Dumps the AST immediately after structuralization (before any
    /// refinement) to `<output>.unstructured`, per SPEC_FULL §11.3.
    #[arg(long = "emit-unstructured")]
    pub emit_unstructured: bool,

    /// A TOML file overlaying any of the above not given on the command
    /// line (§10.3). CLI flags win over file values.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Increases log verbosity; repeatable (`-v`, `-vv`). Overridden by
    /// `RUST_LOG` when set.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The on-disk shape of `--config <toml>`. Every field optional: it only
/// fills gaps the CLI flags left unset.
#[derive(Deserialize, Default)]
struct ConfigFile {
    smt_timeout_ms: Option<u32>,
    smt_tactics_cbr: Option<String>,
    smt_tactics_final: Option<String>,
    emit_unstructured: Option<bool>,
}

/// The fully-resolved configuration driving one run: CLI flags overlaid on
/// an optional config file, defaults filling whatever neither gave.
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub smt_timeout_ms: u32,
    pub smt_tactics_cbr: Option<String>,
    pub smt_tactics_final: Option<String>,
    pub emit_unstructured: bool,
}

impl Config {
    pub fn resolve(cli: Cli) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
                toml::from_str::<ConfigFile>(&text).map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?
            }
            None => ConfigFile::default(),
        };

        Ok(Self {
            input: cli.input,
            output: cli.output,
            smt_timeout_ms: cli.smt_timeout_ms.or(file.smt_timeout_ms).unwrap_or(DEFAULT_SMT_TIMEOUT_MS),
            smt_tactics_cbr: cli.smt_tactics_cbr.or(file.smt_tactics_cbr),
            smt_tactics_final: cli.smt_tactics_final.or(file.smt_tactics_final),
            emit_unstructured: cli.emit_unstructured || file.emit_unstructured.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_win_over_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("delinear.toml");
        std::fs::write(&config_path, "smt_timeout_ms = 5000\n").expect("write config");

        let cli = Cli {
            input: "in.toml".into(),
            output: "out.c".into(),
            smt_timeout_ms: Some(20_000),
            smt_tactics_cbr: None,
            smt_tactics_final: None,
            emit_unstructured: false,
            config: Some(config_path),
            verbose: 0,
        };
        let resolved = Config::resolve(cli).expect("resolves cleanly");
        assert_eq!(resolved.smt_timeout_ms, 20_000);
    }

    #[test]
    fn config_file_fills_gaps_left_by_cli() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("delinear.toml");
        std::fs::write(&config_path, "smt_timeout_ms = 5000\n").expect("write config");

        let cli = Cli {
            input: "in.toml".into(),
            output: "out.c".into(),
            smt_timeout_ms: None,
            smt_tactics_cbr: None,
            smt_tactics_final: None,
            emit_unstructured: false,
            config: Some(config_path),
            verbose: 0,
        };
        let resolved = Config::resolve(cli).expect("resolves cleanly");
        assert_eq!(resolved.smt_timeout_ms, 5000);
    }

    #[test]
    fn defaults_apply_with_no_flags_and_no_config() {
        let cli = Cli {
            input: "in.toml".into(),
            output: "out.c".into(),
            smt_timeout_ms: None,
            smt_tactics_cbr: None,
            smt_tactics_final: None,
            emit_unstructured: false,
            config: None,
            verbose: 0,
        };
        let resolved = Config::resolve(cli).expect("resolves cleanly");
        assert_eq!(resolved.smt_timeout_ms, DEFAULT_SMT_TIMEOUT_MS);
    }
}
