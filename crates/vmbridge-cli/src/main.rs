//! vmbridge command-line front-end.
//!
//! - `vmbridge scan` runs the resolution driver over a sequence of symbol
//!   dumps (one per compilation round) and writes the manifest.
//! - `vmbridge generate` turns a manifest into Swift wrapper sources.
//! - `vmbridge digest` prints the BLAKE3 digest of a manifest.
//!
//! Logging goes to stderr; `RUST_LOG` controls verbosity (default `info`).

#![deny(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vmbridge_codegen::config::GeneratorConfig;
use vmbridge_manifest::store;
use vmbridge_scan::prelude::*;

#[derive(Parser)]
#[command(name = "vmbridge")]
#[command(about = "Bridge shared view-models to observable Swift wrappers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve marked view-models across rounds and write the manifest
    Scan {
        /// Symbol dump for one round; repeat in round order
        #[arg(long = "round", required = true)]
        rounds: Vec<PathBuf>,
        /// Manifest file to write
        #[arg(long)]
        out: PathBuf,
        /// Additional accepted state container (qualified name)
        #[arg(long = "state-container")]
        state_containers: Vec<String>,
        /// Fail if any view-model was rejected
        #[arg(long)]
        deny_diagnostics: bool,
    },
    /// Generate Swift wrappers from a manifest
    Generate {
        /// Manifest file to read
        #[arg(long)]
        manifest: PathBuf,
        /// Directory receiving the generated units
        #[arg(long)]
        out_dir: PathBuf,
        /// Generator config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fail if any entry could not be generated
        #[arg(long)]
        strict: bool,
    },
    /// Print the digest of a manifest's canonical encoding
    Digest {
        /// Manifest file to read
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            rounds,
            out,
            state_containers,
            deny_diagnostics,
        } => run_scan(&rounds, &out, state_containers, deny_diagnostics),
        Commands::Generate {
            manifest,
            out_dir,
            config,
            strict,
        } => run_generate(&manifest, &out_dir, config.as_deref(), strict),
        Commands::Digest { manifest } => run_digest(&manifest),
    }
}

fn load_round(path: &Path) -> Result<SymbolTable> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SymbolTable::from_json(&text)
        .with_context(|| format!("Failed to parse symbol dump {}", path.display()))
}

fn run_scan(
    rounds: &[PathBuf],
    out: &Path,
    extra_containers: Vec<String>,
    deny_diagnostics: bool,
) -> Result<()> {
    let mut config = ScanConfig::default();
    for container in extra_containers {
        if !config.state_containers.contains(&container) {
            config.state_containers.push(container);
        }
    }

    let mut driver = ResolutionDriver::new(config, FileSink::new(out));
    for path in rounds {
        let table = load_round(path)?;
        match driver.process(&table)? {
            PassOutcome::Deferred { pass, count } => {
                tracing::info!(pass, deferred = count, round = %path.display(), "round deferred");
            }
            PassOutcome::Written { pass, entries } => {
                tracing::info!(pass, entries, round = %path.display(), "round resolved");
            }
            PassOutcome::AlreadyDone => {
                tracing::debug!(round = %path.display(), "manifest already written; round ignored");
            }
        }
    }
    driver.finish()?;

    let diagnostics = driver.diagnostics();
    if !diagnostics.is_empty() {
        tracing::warn!(count = diagnostics.len(), "view-models rejected");
    }
    if let Some(digest) = driver.sink().digest() {
        println!("{} {}", digest, out.display());
    }
    if deny_diagnostics && !diagnostics.is_empty() {
        let rules: Vec<String> = diagnostics
            .iter()
            .map(|d| format!("{} ({})", d.symbol(), d.code()))
            .collect();
        bail!(
            "{} view-model(s) rejected: {}",
            diagnostics.len(),
            rules.join(", ")
        );
    }
    Ok(())
}

fn run_generate(
    manifest: &Path,
    out_dir: &Path,
    config: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    let summary = vmbridge_codegen::run(manifest, out_dir, &config)?;
    for path in &summary.report.written {
        println!("{}", path.display());
    }
    if strict && !summary.failures.is_empty() {
        let names: Vec<String> = summary.failures.iter().map(|e| e.to_string()).collect();
        bail!(
            "{} entr{} not generated:\n{}",
            names.len(),
            if names.len() == 1 { "y" } else { "ies" },
            names.join("\n")
        );
    }
    Ok(())
}

fn run_digest(manifest: &Path) -> Result<()> {
    let parsed = store::read_manifest(manifest)?;
    println!("{}", parsed.digest()?);
    Ok(())
}
