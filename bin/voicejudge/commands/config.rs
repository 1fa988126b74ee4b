//! Config command - show the merged configuration

use crate::print_banner;
use crate::style::*;
use anyhow::Result;
use std::path::Path;
use voice_judge::config::default_config_path;
use voice_judge::ClientConfig;

pub fn run(config: &ClientConfig, explicit: Option<&Path>) -> Result<()> {
    print_banner();
    print_header("Configuration");

    let source = match explicit {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };
    print_key_value("Source", &source);
    println!();

    for line in config.to_toml()?.lines() {
        println!("  {}", line);
    }
    println!();
    Ok(())
}
