//! Interpreting what the remote model says.
//!
//! The model is told to answer either in plain Portuguese or, once it has
//! every field, with a fenced JSON object carrying `"ready": true`. Anything
//! that does not validate is shown to the user as text.

use chrono::{NaiveDate, NaiveTime};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::entities::is_valid_email;
use crate::intent::pad_names;
use crate::meeting::{DEFAULT_TITLE, ParsedMeeting, READY_CONFIDENCE, default_end, describe, short_date};

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());
static BARE_READY_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)\{.*"ready"\s*:\s*true.*\}"#).unwrap());

/// Shown when the reply was nothing but an unusable JSON block.
const UNREADABLE_REPLY: &str = "Desculpe, não consegui entender a resposta. Pode repetir os dados da reunião?";

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteReply {
    /// Free text to show the user as is.
    Conversational(String),
    /// A complete, validated proposal.
    Structured(ParsedMeeting),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProposal {
    ready: bool,
    title: Option<String>,
    participants: Vec<String>,
    participant_names: Vec<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    description: Option<String>,
    confidence: Option<f64>,
    #[serde(rename = "dateLabel", alias = "date_label")]
    date_label: Option<String>,
}

/// Classify the model's reply. A proposal dated before `today` is not
/// accepted as structured.
pub fn parse_reply(content: &str, today: NaiveDate) -> RemoteReply {
    let candidate = FENCED_JSON
        .captures(content)
        .and_then(|caps| caps.get(1))
        .or_else(|| BARE_READY_JSON.find(content));

    if let Some(json) = candidate {
        match serde_json::from_str::<RawProposal>(json.as_str().trim()) {
            Ok(raw) => {
                if let Some(meeting) = validate(raw, today) {
                    return RemoteReply::Structured(meeting);
                }
                debug!("remote proposal incomplete, showing reply as text");
            }
            Err(e) => debug!("remote JSON did not parse: {}", e),
        }
    }

    RemoteReply::Conversational(strip_json(content))
}

fn validate(raw: RawProposal, today: NaiveDate) -> Option<ParsedMeeting> {
    if !raw.ready {
        return None;
    }
    let date = NaiveDate::parse_from_str(raw.date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
    if date < today {
        debug!("remote proposal dated {} is in the past", date);
        return None;
    }
    let start = parse_clock(raw.start_time.as_deref()?)?;

    let mut participants: Vec<String> = Vec::new();
    let mut participant_names: Vec<String> = Vec::new();
    for (i, email) in raw.participants.iter().enumerate() {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) || participants.contains(&email) {
            continue;
        }
        let name = raw
            .participant_names
            .get(i)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        participants.push(email);
        match name {
            Some(name) => participant_names.push(name),
            // Fill the gap now so later names keep their index.
            None => pad_names(&participants, &mut participant_names),
        }
    }
    if participants.is_empty() {
        return None;
    }
    pad_names(&participants, &mut participant_names);

    let end = raw
        .end_time
        .as_deref()
        .and_then(parse_clock)
        .filter(|end| *end > start)
        .unwrap_or_else(|| default_end(start));

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| describe(&title));
    let date_label = raw
        .date_label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| short_date(date));
    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(READY_CONFIDENCE);

    Some(ParsedMeeting {
        title,
        participants,
        participant_names,
        date: Some(date),
        start_time: Some(start),
        end_time: Some(end),
        description,
        ready: true,
        missing: Vec::new(),
        date_label,
        confidence,
    })
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

fn strip_json(content: &str) -> String {
    let without_fences = FENCED_JSON.replace_all(content, "");
    let without_bare = BARE_READY_JSON.replace_all(&without_fences, "");
    let text = without_bare.trim();
    if text.is_empty() {
        UNREADABLE_REPLY.to_string()
    } else {
        text.to_string()
    }
}
