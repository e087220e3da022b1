use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::{json, Map, Value};

use zirv_core::{load_elf_file, DEFAULT_MEM_SIZE};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct ZirvInspect {
    /// ELF file path
    #[clap(short = 'e', long)]
    pub elf: PathBuf,

    /// Exclusive upper bound of the guest address space
    #[clap(short = 'm', long, default_value_t = DEFAULT_MEM_SIZE)]
    pub max_mem: u32,

    /// Print every initialized word
    #[clap(short = 'd', long, default_value_t = false)]
    pub dump: bool,

    /// Write the loaded image as JSON to this path
    #[clap(short = 'o', long)]
    pub json: Option<PathBuf>,
}

impl ZirvInspect {
    pub fn run(&self) -> Result<()> {
        println!(
            "{} Inspect {}",
            format!("{: >12}", "Command").bright_green().bold(),
            self.elf.display()
        );

        let program = load_elf_file(&self.elf, self.max_mem)
            .with_context(|| format!("Failed loading guest program {}", self.elf.display()))?;

        println!(
            "{} 0x{:08x}",
            format!("{: >12}", "Entry").bright_green().bold(),
            program.entry
        );
        println!(
            "{} {}",
            format!("{: >12}", "Words").bright_green().bold(),
            program.image.len()
        );
        if let Some((start, end)) = program.image.addr_range() {
            println!(
                "{} 0x{:08x}..0x{:08x}",
                format!("{: >12}", "Range").bright_green().bold(),
                start,
                end
            );
        }

        if self.dump {
            for (addr, word) in program.image.iter() {
                println!("0x{addr:08x}: 0x{word:08x}");
            }
        }

        if let Some(path) = &self.json {
            let mut image = Map::new();
            for (addr, word) in program.image.iter() {
                image.insert(format!("0x{addr:08x}"), json!(format!("0x{word:08x}")));
            }
            let dump = json!({
                "entry": format!("0x{:08x}", program.entry),
                "max_mem": format!("0x{:08x}", self.max_mem),
                "image": Value::Object(image),
            });
            fs::write(path, serde_json::to_string_pretty(&dump)?)
                .with_context(|| format!("Failed writing image dump {}", path.display()))?;
            tracing::info!("Image dump written to {}", path.display());
        }

        Ok(())
    }
}
