// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire: PDF booklet imposition from the command line.
//
// Entry point. Initialises logging, loads configuration, and dispatches the
// subcommand.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use quire_core::QuireConfig;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Quire starting");

    let config = match &cli.config {
        Some(path) => match QuireConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("quire: cannot load config {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => QuireConfig::default(),
    };

    let result = match cli.command {
        Command::Info { input } => commands::info(&input),
        Command::Plan(args) => commands::plan(&args),
        Command::AutoEnhance { input } => commands::auto_enhance(&input),
        Command::Export(args) => commands::export(&config, &args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(class = ?err.class(), "{err}");
            eprintln!("quire: {err}");
            ExitCode::FAILURE
        }
    }
}
