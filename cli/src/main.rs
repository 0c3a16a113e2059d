// Copyright (c) 2026 TransactID Contributors. MIT License.
// See LICENSE for details.

//! # TransactID Command Line
//!
//! Entry point for the `transactid` binary. Parses CLI arguments,
//! initializes logging and runs one subcommand:
//!
//! - `inspect`: print an envelope header
//! - `parse`: decode a message without validating it
//! - `validate`: run every signature and certificate check
//! - `change-status`: rewrite an envelope's status pair
//! - `create`: build a message from a JSON parameters file
//! - `keygen`: write an RSA or secp256k1 keypair as PEM

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{Commands, TransactIdCli};

fn main() -> Result<()> {
    let cli = TransactIdCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let output = match &cli.command {
        Commands::Inspect(args) => commands::inspect(args)?,
        Commands::Parse(args) => commands::parse(args)?,
        Commands::Validate(args) => commands::validate(args)?,
        Commands::ChangeStatus(args) => commands::change_status(args)?,
        Commands::Create(args) => commands::create(args)?,
        Commands::Keygen(args) => commands::keygen(args)?,
    };
    println!("{output}");
    Ok(())
}
