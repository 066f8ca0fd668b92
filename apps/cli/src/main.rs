//! CV Assistant CLI: tailor CVs, write cover letters, and move CVs between
//! templates with a generative text service.
//!
//! Every run writes Markdown, HTML, and (when a converter is available) PDF
//! under a dated output directory.

mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::run(cli)
}
