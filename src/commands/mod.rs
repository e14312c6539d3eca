pub mod chat;
pub mod config;
pub mod contacts;
pub mod forget;
pub mod parse;

use anyhow::{Context, Result};
use agenda_core::AgendaConfig;

pub fn load_config() -> Result<AgendaConfig> {
    AgendaConfig::load().context("Could not load configuration")
}
