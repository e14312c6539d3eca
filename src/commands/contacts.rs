use agenda_core::contacts::ContactStore;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::store::{self, JsonContactStore};

pub fn run(limit: usize) -> Result<()> {
    let config = super::load_config()?;
    let store = JsonContactStore::open(store::contacts_path(&config.data_path()))
        .context("Could not read known contacts")?;

    let contacts = store.top(limit);
    if contacts.is_empty() {
        println!("{}", "No known contacts yet. They are added when a meeting is scheduled.".dimmed());
        return Ok(());
    }

    println!("{}", "Known contacts".bold());
    for contact in &contacts {
        println!("{}", contact.render());
    }
    Ok(())
}
