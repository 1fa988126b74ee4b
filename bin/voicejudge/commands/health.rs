//! Health command - probe the proving backend

use crate::print_banner;
use crate::style::*;
use anyhow::Result;
use std::time::Instant;
use voice_judge::{BackendClient, ClientConfig};

pub async fn run(config: &ClientConfig) -> Result<()> {
    print_banner();
    print_header("Backend Health");

    print_key_value("Backend", &config.backend_url);

    let backend = BackendClient::from_config(config)?;
    let started = Instant::now();
    match backend.health().await {
        Ok(message) => {
            print_key_value("Latency", &format!("{} ms", started.elapsed().as_millis()));
            println!();
            print_success(&message);
            println!();
            Ok(())
        }
        Err(e) => {
            println!();
            print_error(&format!("Backend unreachable: {}", e));
            println!();
            Err(e.into())
        }
    }
}
