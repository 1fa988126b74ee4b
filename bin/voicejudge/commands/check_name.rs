//! Check-name command

use crate::print_banner;
use crate::style::*;
use anyhow::Result;
use voice_judge::{BackendClient, ClientConfig};

pub async fn run(config: &ClientConfig, name: &str) -> Result<()> {
    print_banner();

    let backend = BackendClient::from_config(config)?;
    if backend.check_model_name(name).await? {
        print_success(&format!("Model name {} is available", style_bold(name)));
    } else {
        print_warning(&format!("Model name {} is already taken", name));
    }
    println!();
    Ok(())
}
