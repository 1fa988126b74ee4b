//! Balance command - credits left for the active account

use crate::commands::connect_wallet;
use crate::print_banner;
use crate::style::*;
use anyhow::{anyhow, Result};
use voice_judge::{BackendClient, ClientConfig};

pub async fn run(config: &ClientConfig) -> Result<()> {
    print_banner();
    print_header("Credit Balance");

    let wallet = connect_wallet(config).await;
    let account = wallet
        .active_account()
        .ok_or_else(|| anyhow!("No wallet account connected"))?;

    let backend = BackendClient::from_config(config)?;
    let balance = backend.user_balance(&config.model_name, &account).await?;

    print_key_value("Account", &account);
    print_key_value("Model", &config.model_name);
    println!();
    print_key_value("On-chain requests", &balance.credits.on_chain.to_string());
    print_key_value("Off-chain requests", &balance.credits.off_chain.to_string());
    print_key_value("Total", &balance.credits.total.to_string());

    let remaining = balance.credits.remaining();
    let color = if remaining == 0 {
        colors::RED
    } else {
        colors::GREEN
    };
    print_key_value_colored("Remaining", &remaining.to_string(), color);

    if let Some(message) = balance.message {
        println!();
        print_info(&message);
    }
    println!();
    Ok(())
}
