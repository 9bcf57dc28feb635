//! thesisbuild CLI: render thesis chapters from a YAML settings document.
//!
//! Resolves directory placeholders, locates chapter sources, loads their
//! datasets, and drives an external renderer to produce PDF or DOCX.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
