// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! riagen: generate RIA client proxies from DomainService catalogs.
//!
//! Subcommands:
//! - `generate` renders client code for every DomainService in a catalog;
//! - `generators` lists the registered code generators;
//! - `shared-code-worker` answers share-kind requests on stdin/stdout and is
//!   spawned by `generate --isolated`.
//!
//! Diagnostics go to stderr through `tracing`; `RUST_LOG` refines the filter.

mod generate;
mod prefs;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ria_codegen::GeneratorRegistry;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "riagen",
    author,
    version,
    about = "Generate RIA client proxies from DomainService catalogs",
    disable_help_subcommand = true
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding persisted preferences (defaults to the user config dir).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate client code for a catalog.
    Generate(GenerateArgs),
    /// List registered code generators.
    Generators {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Serve share-kind requests on stdin/stdout.
    SharedCodeWorker,
}

/// Flags of `riagen generate`.
#[derive(Args, Debug, Default)]
pub(crate) struct GenerateArgs {
    /// Catalog describing the server assembly (JSON).
    #[arg(long)]
    pub catalog: PathBuf,

    /// Target language: C# or VB (aliases accepted).
    #[arg(long)]
    pub language: Option<String>,

    /// Generator to use; defaults to the single custom generator or the built-in one.
    #[arg(long)]
    pub generator: Option<String>,

    /// Source file compiled into both server and client (repeatable).
    #[arg(long = "shared-file")]
    pub shared_files: Vec<String>,

    /// Directory searched for `<assembly>.symbols.json` (repeatable).
    #[arg(long = "symbol-path")]
    pub symbol_paths: Vec<String>,

    /// Assembly referenced by the client project (repeatable).
    #[arg(long = "client-assembly")]
    pub client_assemblies: Vec<String>,

    /// Root namespace of the client project.
    #[arg(long)]
    pub client_root_namespace: Option<String>,

    /// Root namespace of the server project.
    #[arg(long)]
    pub server_root_namespace: Option<String>,

    /// Emit namespace-qualified type names.
    #[arg(long)]
    pub full_type_names: bool,

    /// Run sharing analysis in a separate worker process.
    #[arg(long)]
    pub isolated: bool,

    /// Write to this file instead of stdout; unchanged output is not rewritten.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Persist language, generator, symbol paths and isolation as defaults.
    #[arg(long)]
    pub save_prefs: bool,
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}

fn list_generators(json: bool) -> Result<()> {
    let registry = GeneratorRegistry::with_builtin();
    let mut out = io::stdout().lock();
    if json {
        let entries: Vec<_> = registry.metadata().collect();
        serde_json::to_writer_pretty(&mut out, &entries).context("failed to encode generator list")?;
        writeln!(out)?;
    } else {
        for metadata in registry.metadata() {
            writeln!(out, "{}\t{}", metadata.name, metadata.language)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_worker() -> Result<()> {
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let served = ria_sharing::serve_worker(stdin, stdout).context("shared code worker failed")?;
    tracing::debug!(served, "shared code worker finished");
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Generate(args) => generate::run(&args, cli.config_dir.as_deref()),
        Commands::Generators { json } => list_generators(json).map(|()| ExitCode::SUCCESS),
        Commands::SharedCodeWorker => run_worker().map(|()| ExitCode::SUCCESS),
    }
}
