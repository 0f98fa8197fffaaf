#![cfg_attr(not(test), deny(clippy::unwrap_used))]
mod codegen;
mod commands;
mod config;

use std::error::Error;

use clap::*;
use commands::{Generate, Initialize};

#[derive(Parser)]
#[command(name = "sql-bind", bin_name = "sql-bind", version, about)]
enum Command {
    Generate(Generate),
    Init(Initialize),
}

fn main() -> Result<(), Box<dyn Error>> {
    let command = Command::parse();
    match command {
        Command::Generate(args) => args.run(),
        Command::Init(args) => args.run(),
    }
}
