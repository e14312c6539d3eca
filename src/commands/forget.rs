use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::store::{self, HistoryFile, JsonContactStore};

/// Delete the saved conversation and known contacts.
pub fn run(yes: bool) -> Result<()> {
    let config = super::load_config()?;
    let data_dir = config.data_path();

    if !yes {
        let proceed = Confirm::new()
            .with_prompt("  Forget the saved conversation and all known contacts?")
            .default(false)
            .interact()?;
        if !proceed {
            return Ok(());
        }
    }

    let history_removed = HistoryFile::new(store::history_path(&data_dir)).clear()?;
    let contacts_removed = JsonContactStore::delete(&store::contacts_path(&data_dir))?;

    if history_removed || contacts_removed {
        println!("{}", "  Forgotten.".green());
    } else {
        println!("{}", "  Nothing to forget.".dimmed());
    }
    Ok(())
}
