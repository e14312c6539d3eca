//! Combines the extractors into a single meeting proposal.

use chrono::NaiveDate;
use log::debug;

use crate::entities::{extract_emails, humanize_local_part, name_for};
use crate::meeting::{MissingField, ParsedMeeting, confidence_for, describe};
use crate::subject::extract_title;
use crate::temporal::{resolve_date, resolve_time};

/// Extract a meeting proposal from `text`, resolving relative dates against `today`.
///
/// Pure: the same text and reference date always give the same result.
pub fn parse_meeting(text: &str, today: NaiveDate) -> ParsedMeeting {
    let participants = extract_emails(text);
    let mut participant_names: Vec<String> = participants
        .iter()
        .map(|email| name_for(text, email))
        .collect();
    pad_names(&participants, &mut participant_names);

    let date = resolve_date(text, today);
    let time = resolve_time(text);
    let title = extract_title(text);

    let mut missing = Vec::new();
    if participants.is_empty() {
        missing.push(MissingField::Email);
    }
    if date.is_none() {
        missing.push(MissingField::Date);
    }
    if time.is_none() {
        missing.push(MissingField::Time);
    }

    let ready = missing.is_empty();
    debug!(
        "parsed {} participant(s), date={:?}, time={:?}, missing={:?}",
        participants.len(),
        date.as_ref().map(|d| d.date),
        time.map(|t| t.start),
        missing.iter().map(MissingField::id).collect::<Vec<_>>()
    );

    ParsedMeeting {
        description: describe(&title),
        title,
        participants,
        participant_names,
        date: date.as_ref().map(|d| d.date),
        start_time: time.map(|t| t.start),
        end_time: time.map(|t| t.end),
        ready,
        confidence: confidence_for(missing.len()),
        missing,
        date_label: date.map(|d| d.label).unwrap_or_default(),
    }
}

/// Make `names` exactly as long as `participants`, filling gaps from the
/// email addresses.
pub fn pad_names(participants: &[String], names: &mut Vec<String>) {
    names.truncate(participants.len());
    while names.len() < participants.len() {
        names.push(humanize_local_part(&participants[names.len()]));
    }
}

/// Follow-up question listing what is still needed, one bullet per field.
pub fn missing_fields_message(missing: &[MissingField]) -> String {
    let bullets: Vec<String> = missing
        .iter()
        .map(|field| format!("• {}", field.prompt_label()))
        .collect();
    format!(
        "Ainda preciso de:\n{}\n\nComplete a informação para eu agendar! 😊",
        bullets.join("\n")
    )
}
