//! cli
//!
//! Command-line interface layer for modsync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to the sync engine
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::engine::SyncEngine`]; all repository state changes flow through
//! the engine's state machine.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::core::config::{ModuleSpec, SyncConfig};
use crate::core::types::{Constraint, Strategy};
use crate::engine::SyncEngine;
use crate::git::SystemGit;
use crate::oplog::OperationLog;
use crate::repo::RepositoryHandle;
use crate::resolver;

/// Modsync - keep module working copies in the git state a constraint demands
#[derive(Parser, Debug)]
#[command(name = "modsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if modsync was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synchronize one repository to satisfy a constraint
    Sync {
        /// Local working-copy path
        path: PathBuf,

        /// Remote origin URL (required when the path does not exist yet)
        #[arg(long, default_value = "")]
        url: String,

        /// Version range or dev- branch selector; empty keeps the current checkout
        #[arg(long, default_value = "")]
        constraint: String,

        /// Update strategy: none, default, pull, merge, no-git
        #[arg(long, default_value = "default", value_parser = parse_strategy)]
        strategy: Strategy,

        /// Sync even when the working copy has uncommitted changes
        #[arg(long)]
        allow_dirty: bool,

        /// Skip pulling from the remote
        #[arg(long)]
        no_pull: bool,
    },

    /// Synchronize every module listed in a manifest
    SyncAll {
        /// Manifest path
        #[arg(long, default_value = "modsync.toml")]
        config: PathBuf,
    },

    /// Show which tag or branch a constraint resolves to, without mutating
    Resolve {
        /// Local working-copy path
        path: PathBuf,

        /// Version range or dev- branch selector
        constraint: String,
    },

    /// Show the sync-visible state of a working copy
    Status {
        /// Local working-copy path
        path: PathBuf,
    },
}

fn parse_strategy(raw: &str) -> Result<Strategy, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn init_tracing(debug: bool, quiet: bool) {
    let default = if debug {
        "modsync=debug"
    } else if quiet {
        "modsync=error"
    } else {
        "modsync=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    if let Some(dir) = &cli.cwd {
        std::env::set_current_dir(dir)
            .with_context(|| format!("unable to change into {}", dir.display()))?;
    }

    match cli.command {
        Command::Sync {
            path,
            url,
            constraint,
            strategy,
            allow_dirty,
            no_pull,
        } => cmd_sync(path, url, constraint, strategy, allow_dirty, no_pull, cli.quiet),
        Command::SyncAll { config } => cmd_sync_all(&config, cli.quiet),
        Command::Resolve { path, constraint } => cmd_resolve(&path, &constraint),
        Command::Status { path } => cmd_status(&path),
    }
}

fn new_engine() -> SyncEngine {
    SyncEngine::new(Box::new(SystemGit::new()), OperationLog::default())
}

#[allow(clippy::too_many_arguments)]
fn cmd_sync(
    path: PathBuf,
    url: String,
    constraint: String,
    strategy: Strategy,
    allow_dirty: bool,
    no_pull: bool,
    quiet: bool,
) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if url.is_empty() && strategy != Strategy::NoGit && !path.exists() {
        bail!("'{}' does not exist and no --url was given", path.display());
    }

    let spec = ModuleSpec {
        name,
        path,
        url,
        constraint: Constraint::new(constraint),
        strategy,
        must_be_clean: !allow_dirty,
        allow_remote_integration: !no_pull,
    };

    let outcome = new_engine().sync(&spec)?;
    if !quiet {
        match (&outcome.commit, outcome.just_updated) {
            (Some(commit), true) => println!("{}: updated to {}", spec.name, commit.short(12)),
            (Some(commit), false) => println!("{}: up to date at {}", spec.name, commit.short(12)),
            (None, _) => println!("{}: files-only module, nothing to do", spec.name),
        }
    }
    Ok(())
}

fn cmd_sync_all(config_path: &std::path::Path, quiet: bool) -> Result<()> {
    let config = SyncConfig::load(config_path)?;
    let report = new_engine().sync_all(&config);

    if !quiet {
        for result in &report.results {
            match &result.outcome {
                Ok(outcome) if outcome.just_updated => println!("{}: updated", result.name),
                Ok(_) => println!("{}: up to date", result.name),
                Err(err) => println!("{}: failed ({err})", result.name),
            }
        }
        println!(
            "{} module(s): {} updated, {} failed",
            report.results.len(),
            report.updated(),
            report.failed()
        );
    }

    if !report.is_success() {
        bail!("{} module(s) failed to sync", report.failed());
    }
    Ok(())
}

fn cmd_resolve(path: &std::path::Path, constraint: &str) -> Result<()> {
    let backend = SystemGit::new();
    let handle = RepositoryHandle::open(&backend, path)?;
    let tags = handle.tags()?;
    let branches = handle.remote_branches(true)?;

    match resolver::find_best_tag_or_branch(&tags, &branches, constraint) {
        Some(target) => {
            println!("{target}");
            Ok(())
        }
        None => bail!("nothing matched to checkout with: {constraint}"),
    }
}

fn cmd_status(path: &std::path::Path) -> Result<()> {
    let backend = SystemGit::new();
    let handle = RepositoryHandle::open(&backend, path)?;
    let state = handle.state()?;

    println!("path:   {}", state.path.display());
    println!("branch: {}", state.branch);
    println!("commit: {}", state.commit);
    println!("dirty:  {}", state.dirty);
    Ok(())
}
