use agenda_core::clock::Clock;
use agenda_core::{AgendaConfig, Mode};
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::store;

pub fn run(mode: Option<Mode>) -> Result<()> {
    let config_path = AgendaConfig::config_path()?;
    let mut config = super::load_config()?;

    if let Some(mode) = mode {
        config.mode = mode;
        config.save()?;
        println!("{}", format!("Default mode set to {}", mode).green());
        println!();
    }

    let data_dir = config.data_path();

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Contacts:   {}", store::contacts_path(&data_dir).display());
    println!("  History:    {}", store::history_path(&data_dir).display());
    println!();

    println!("{}", "Settings".bold());
    println!("  Mode:       {}", config.mode);
    println!(
        "  Now:        {} (UTC{:+})",
        config.clock()?.now().format("%Y-%m-%d %H:%M"),
        config.utc_offset_hours
    );
    println!("  Model:      {} at {}", config.remote.model, config.remote.endpoint);
    let key_state = if config.api_key().is_some() {
        "set".green().to_string()
    } else {
        "not set".yellow().to_string()
    };
    println!("  API key:    ${} {}", config.remote.api_key_env, key_state);
    match &config.webhook.url {
        Some(url) => println!("  Webhook:    {}", url),
        None => println!("  Webhook:    {}", "not configured".yellow()),
    }

    Ok(())
}
