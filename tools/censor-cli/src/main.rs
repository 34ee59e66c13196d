//! `trcensor`: fMRI 删失文件命令行工具.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).env().init()?;

    let stdout = std::io::stdout();
    commands::run(cli.command, &mut stdout.lock())
}
