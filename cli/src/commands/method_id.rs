use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use zirv_core::MethodId;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct ZirvMethodId {
    /// Method identifier file path
    #[clap(short = 'i', long)]
    pub id: PathBuf,
}

impl ZirvMethodId {
    pub fn run(&self) -> Result<()> {
        println!(
            "{} MethodId {}",
            format!("{: >12}", "Command").bright_green().bold(),
            self.id.display()
        );

        let method_id = MethodId::read_from_file(&self.id)
            .with_context(|| format!("Failed reading method id {}", self.id.display()))?;

        for (po2, digest) in method_id.tiers() {
            println!(
                "{} {}",
                format!("{: >12}", format!("2^{po2}")).bright_green().bold(),
                digest
            );
        }

        Ok(())
    }
}
