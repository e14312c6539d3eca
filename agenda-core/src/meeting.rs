//! The structured meeting proposal produced by both extraction pipelines.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Title used when nothing better can be extracted.
pub const DEFAULT_TITLE: &str = "Reunião";

/// Confidence reported by the local pipeline once every field is present.
pub const READY_CONFIDENCE: f64 = 0.9;

/// A required scheduling field that extraction could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MissingField {
    #[serde(rename = "email do participante")]
    Email,
    #[serde(rename = "data da reunião")]
    Date,
    #[serde(rename = "horário")]
    Time,
}

impl MissingField {
    /// All required fields, in the order they are reported.
    pub const ALL: [MissingField; 3] = [MissingField::Email, MissingField::Date, MissingField::Time];

    /// Short identifier for logs and JSON consumers.
    pub fn id(&self) -> &'static str {
        match self {
            MissingField::Email => "email",
            MissingField::Date => "date",
            MissingField::Time => "time",
        }
    }

    /// Human-readable label with an example, shown in follow-up questions.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            MissingField::Email => "📧 **Email** do(s) participante(s)",
            MissingField::Date => "📅 **Data** (ex: amanhã, segunda, dia 15/02)",
            MissingField::Time => "🕐 **Horário** (ex: 14h, 10:30)",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissingField::Email => "email do participante",
            MissingField::Date => "data da reunião",
            MissingField::Time => "horário",
        };
        f.write_str(label)
    }
}

/// A meeting proposal extracted from free text (or returned by the remote model).
///
/// `participants` and `participant_names` are index-aligned and always the
/// same length. `ready` is true exactly when `missing` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMeeting {
    pub title: String,
    pub participants: Vec<String>,
    pub participant_names: Vec<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: String,
    pub ready: bool,
    pub missing: Vec<MissingField>,
    #[serde(rename = "dateLabel")]
    pub date_label: String,
    pub confidence: f64,
}

impl ParsedMeeting {
    /// Participants paired with their display names.
    pub fn attendees(&self) -> impl Iterator<Item = (&str, &str)> {
        self.participants
            .iter()
            .zip(self.participant_names.iter())
            .map(|(email, name)| (email.as_str(), name.as_str()))
    }
}

/// Confidence for a pass that found everything except `missing_count` fields.
pub fn confidence_for(missing_count: usize) -> f64 {
    if missing_count == 0 {
        READY_CONFIDENCE
    } else {
        let found = MissingField::ALL.len().saturating_sub(missing_count);
        found as f64 / MissingField::ALL.len() as f64
    }
}

/// Default description when none was supplied.
pub fn describe(title: &str) -> String {
    format!("Reunião sobre {}", title)
}

/// Default end: one hour after start. The hour wraps past midnight.
pub fn default_end(start: NaiveTime) -> NaiveTime {
    start.overflowing_add_signed(Duration::hours(1)).0
}

/// Format a date the way labels show it: DD/MM.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_by_missing_count() {
        assert_eq!(confidence_for(0), 0.9);
        assert!((confidence_for(1) - 2.0 / 3.0).abs() < 1e-9);
        assert!((confidence_for(2) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(confidence_for(3), 0.0);
    }

    #[test]
    fn default_end_adds_one_hour() {
        let start = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(default_end(start), NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn default_end_wraps_at_midnight() {
        let start = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(default_end(start), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn missing_fields_serialize_as_labels() {
        let json = serde_json::to_string(&MissingField::ALL).unwrap();
        assert_eq!(json, r#"["email do participante","data da reunião","horário"]"#);
    }

    #[test]
    fn times_serialize_with_seconds() {
        let meeting = ParsedMeeting {
            title: "Onboarding".into(),
            participants: vec!["ana@x.com".into()],
            participant_names: vec!["Ana".into()],
            date: NaiveDate::from_ymd_opt(2025, 1, 11),
            start_time: NaiveTime::from_hms_opt(14, 0, 0),
            end_time: NaiveTime::from_hms_opt(15, 0, 0),
            description: describe("Onboarding"),
            ready: true,
            missing: vec![],
            date_label: "Amanhã (11/01)".into(),
            confidence: 0.9,
        };
        let value = serde_json::to_value(&meeting).unwrap();
        assert_eq!(value["date"], "2025-01-11");
        assert_eq!(value["start_time"], "14:00:00");
        assert_eq!(value["end_time"], "15:00:00");
        assert_eq!(value["dateLabel"], "Amanhã (11/01)");
    }
}
