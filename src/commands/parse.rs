use agenda_core::clock::Clock;
use agenda_core::intent::missing_fields_message;
use agenda_core::parse_meeting;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::render::Render;

/// Extract a meeting from one piece of text with the local pipeline.
pub fn run(text: String, today: Option<String>, json: bool) -> Result<()> {
    let today = match today {
        Some(s) => parse_reference_date(&s)?,
        None => super::load_config()?.clock()?.today(),
    };

    let meeting = parse_meeting(&text, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&meeting)?);
        return Ok(());
    }

    println!("{}", meeting.render());
    if !meeting.ready {
        println!();
        for line in missing_fields_message(&meeting.missing).lines() {
            println!("  {}", line.replace("**", "").dimmed());
        }
    }
    Ok(())
}

fn parse_reference_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("Could not parse date: \"{}\" (expected YYYY-MM-DD)", input))
}
