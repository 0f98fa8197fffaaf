use std::error::Error;

use clap::Parser;

use crate::config::{CONFIG_FILE, TomlConfig};

#[derive(Parser, Debug, Clone)]
#[command(about = "Write a default configuration file", long_about = None)]
#[must_use]
pub struct Initialize {}

impl Initialize {
    pub fn run(self) -> Result<(), Box<dyn Error>> {
        let exists = std::fs::exists(CONFIG_FILE)?;
        if exists {
            eprintln!("{CONFIG_FILE} already exists.\nExiting...");
            return Ok(());
        }

        let toml = toml::to_string_pretty(&TomlConfig::default())?;
        std::fs::write(CONFIG_FILE, toml)?;
        eprintln!("Written config to {CONFIG_FILE}!");
        Ok(())
    }
}
