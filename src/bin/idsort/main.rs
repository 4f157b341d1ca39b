//! Command-line entry point: `idsort layout` generates a device descriptor
//! from geometry parameters; `idsort optimize` runs the evolutionary driver
//! against a descriptor and a magnet catalogue.

#[macro_use]
extern crate error_chain;

mod layout_cmd;
mod optimize_cmd;

use clap::{Parser, Subcommand};
use colored::*;
use idsort::errors::*;
use log::error;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "idsort", version = VERSION, about = "Insertion-device magnet assembly optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an ID descriptor from geometry parameters.
    Layout(layout_cmd::LayoutArgs),
    /// Optimize a magnet assignment against a descriptor and catalogue.
    Optimize(optimize_cmd::OptimizeArgs),
}

fn main() {
    env_logger::init();

    if let Err(ref e) = run() {
        error!("{}: {}", "error".red(), e);
        for e in e.iter().skip(1) {
            error!("caused by: {}", e);
        }
        if let Some(backtrace) = e.backtrace() {
            error!("backtrace: {:?}", backtrace);
        }
        std::process::exit(1);
    }

    std::process::exit(0);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Layout(args) => layout_cmd::run(args),
        Command::Optimize(args) => optimize_cmd::run(args),
    }
}
