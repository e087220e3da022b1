use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ZirvInspect, ZirvMethodId};

// Main enum defining zirv subcommands.
#[derive(Parser)]
#[command(
    name = "zirv",
    bin_name = "zirv",
    version,
    about = "CLI tool for Zirv",
    long_about = "Zirv is a command-line tool to inspect Zirv guest programs and method identifiers."
)]
pub enum Zirv {
    Inspect(ZirvInspect),
    MethodId(ZirvMethodId),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Zirv::parse() {
        Zirv::Inspect(cmd) => {
            cmd.run().context("Error executing Inspect command")?;
        }
        Zirv::MethodId(cmd) => {
            cmd.run().context("Error executing MethodId command")?;
        }
    }

    Ok(())
}
