//! Model command - show the marketplace descriptor

use crate::commands::{fetch_descriptor, model_registry};
use crate::print_banner;
use crate::style::*;
use anyhow::Result;
use voice_judge::ClientConfig;

pub async fn run(config: &ClientConfig) -> Result<()> {
    print_banner();
    print_header("Model");

    print_key_value("Name", &config.model_name);

    let Some(registry) = model_registry(config) else {
        print_warning("Marketplace contract not configured.");
        println!(
            "  Set {} and {} to read the descriptor.",
            style_cyan("--network-url"),
            style_cyan("--marketplace-address")
        );
        println!();
        return Ok(());
    };
    print_key_value("Marketplace", &registry.address().to_string());

    let descriptor = fetch_descriptor(config).await;
    if !descriptor.is_loaded() {
        print_warning("Descriptor could not be loaded.");
        println!();
        return Ok(());
    }

    print_key_value("Creator", descriptor.creator().unwrap_or("-"));
    print_key_value("Verifier", descriptor.verifier().unwrap_or("-"));
    println!();
    Ok(())
}
