//! Scheduling sinks: an HTTP webhook (an automation workflow that creates
//! the calendar event) and a dry run that only logs.

use agenda_core::error::{AgendaError, AgendaResult};
use agenda_core::{ParsedMeeting, ScheduleOutcome, SchedulingSink};
use async_trait::async_trait;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ORGANIZER_NAME: &str = "Usuário";

/// Who is scheduling, sent along with every meeting.
#[derive(Debug, Clone)]
pub struct Organizer {
    pub name: String,
    pub email: Option<String>,
    pub timezone: String,
}

impl Organizer {
    pub fn new(name: Option<String>, email: Option<String>, timezone: String) -> Self {
        Organizer {
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ORGANIZER_NAME.to_string()),
            email,
            timezone,
        }
    }
}

#[derive(Serialize)]
struct CreateMeeting<'a> {
    action: &'static str,
    meeting_id: String,
    title: &'a str,
    description: &'a str,
    date: String,
    start_time: String,
    end_time: String,
    participants: &'a [String],
    participant_names: &'a [String],
    organizer_name: &'a str,
    organizer_email: Option<&'a str>,
    status: &'static str,
    timezone: &'a str,
}

impl<'a> CreateMeeting<'a> {
    fn new(meeting: &'a ParsedMeeting, organizer: &'a Organizer) -> AgendaResult<Self> {
        let (Some(date), Some(start), Some(end)) = (meeting.date, meeting.start_time, meeting.end_time)
        else {
            return Err(AgendaError::Sink("meeting has no date or time".into()));
        };

        Ok(CreateMeeting {
            action: "create",
            meeting_id: uuid::Uuid::new_v4().to_string(),
            title: &meeting.title,
            description: &meeting.description,
            date: date.format("%Y-%m-%d").to_string(),
            start_time: start.format("%H:%M:%S").to_string(),
            end_time: end.format("%H:%M:%S").to_string(),
            participants: &meeting.participants,
            participant_names: &meeting.participant_names,
            organizer_name: &organizer.name,
            organizer_email: organizer.email.as_deref(),
            status: "scheduled",
            timezone: &organizer.timezone,
        })
    }
}

/// Posts confirmed meetings to a webhook.
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
    organizer: Organizer,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, organizer: Organizer) -> AgendaResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("agenda/{}", env!("CARGO_PKG_VERSION")))
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| AgendaError::Sink(e.to_string()))?;

        Ok(WebhookSink {
            http,
            url: url.into(),
            organizer,
        })
    }
}

#[async_trait]
impl SchedulingSink for WebhookSink {
    async fn create_meeting(&self, meeting: &ParsedMeeting) -> AgendaResult<ScheduleOutcome> {
        let payload = CreateMeeting::new(meeting, &self.organizer)?;
        debug!("posting meeting {} to webhook", payload.meeting_id);

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgendaError::Sink(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ScheduleOutcome::error(format!("HTTP error: {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgendaError::Sink(format!("Invalid webhook response: {e}")))?;
        debug!("webhook response: {}", body);

        Ok(interpret_response(body))
    }
}

/// Accepts every meeting without contacting anything.
pub struct DryRunSink;

#[async_trait]
impl SchedulingSink for DryRunSink {
    async fn create_meeting(&self, meeting: &ParsedMeeting) -> AgendaResult<ScheduleOutcome> {
        info!(
            "dry run: would schedule '{}' on {:?} at {:?} with {}",
            meeting.title,
            meeting.date,
            meeting.start_time,
            meeting.participants.join(", ")
        );
        Ok(ScheduleOutcome {
            message: Some("Simulação: nada foi enviado".into()),
            ..ScheduleOutcome::success(None, None)
        })
    }
}

/// Make sense of the shapes the workflow may answer with: an object, a
/// one-element array, a JSON string, or an object whose `output` is a
/// (possibly fenced) JSON string.
pub fn interpret_response(raw: Value) -> ScheduleOutcome {
    let mut data = match raw {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    };

    let nested = data
        .get("output")
        .and_then(Value::as_str)
        .and_then(|output| serde_json::from_str::<Value>(strip_fences(output).trim()).ok());
    if let Some(nested) = nested {
        data = nested;
    }

    let event_id = string_at(&data, "/google_event_id").or_else(|| string_at(&data, "/data/id"));
    let succeeded = string_at(&data, "/status").as_deref() == Some("success") || event_id.is_some();
    let message = string_at(&data, "/message");

    if succeeded {
        let link = string_at(&data, "/meet_link")
            .or_else(|| string_at(&data, "/hangoutLink"))
            .or_else(|| string_at(&data, "/conferenceData/entryPoints/0/uri"));
        ScheduleOutcome {
            message: Some(message.unwrap_or_else(|| "Evento criado na agenda".into())),
            ..ScheduleOutcome::success(event_id, link)
        }
    } else {
        ScheduleOutcome::error(message.unwrap_or_else(|| "Resposta desconhecida do webhook".into()))
    }
}

fn strip_fences(s: &str) -> String {
    s.replace("```json", "").replace("```", "")
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::ScheduleStatus;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    fn meeting() -> ParsedMeeting {
        ParsedMeeting {
            title: "Onboarding".into(),
            participants: vec!["joao@email.com".into()],
            participant_names: vec!["Joao".into()],
            date: NaiveDate::from_ymd_opt(2025, 1, 11),
            start_time: NaiveTime::from_hms_opt(14, 0, 0),
            end_time: NaiveTime::from_hms_opt(15, 0, 0),
            description: "Reunião sobre Onboarding".into(),
            ready: true,
            missing: Vec::new(),
            date_label: "Amanhã (11/01)".into(),
            confidence: 0.9,
        }
    }

    // --- payload ---

    #[test]
    fn payload_fields() {
        let organizer = Organizer::new(None, Some("org@x.com".into()), "America/Sao_Paulo".into());
        let m = meeting();
        let payload = serde_json::to_value(CreateMeeting::new(&m, &organizer).unwrap()).unwrap();

        assert_eq!(payload["action"], "create");
        assert_eq!(payload["date"], "2025-01-11");
        assert_eq!(payload["start_time"], "14:00:00");
        assert_eq!(payload["end_time"], "15:00:00");
        assert_eq!(payload["participants"], json!(["joao@email.com"]));
        assert_eq!(payload["participant_names"], json!(["Joao"]));
        assert_eq!(payload["organizer_name"], "Usuário");
        assert_eq!(payload["organizer_email"], "org@x.com");
        assert_eq!(payload["status"], "scheduled");
        assert_eq!(payload["timezone"], "America/Sao_Paulo");
        assert_eq!(payload["meeting_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn incomplete_meeting_is_rejected() {
        let organizer = Organizer::new(Some("Ana".into()), None, "UTC".into());
        let mut m = meeting();
        m.start_time = None;
        assert!(CreateMeeting::new(&m, &organizer).is_err());
    }

    // --- response shapes ---

    #[test]
    fn plain_object_success() {
        let outcome = interpret_response(json!({
            "status": "success",
            "google_event_id": "evt1",
            "meet_link": "https://meet.google.com/abc"
        }));
        assert!(outcome.is_success());
        assert_eq!(outcome.calendar_event_id.as_deref(), Some("evt1"));
        assert_eq!(outcome.conferencing_link.as_deref(), Some("https://meet.google.com/abc"));
    }

    #[test]
    fn array_response_uses_first_element() {
        let outcome = interpret_response(json!([{ "google_event_id": "evt2", "hangoutLink": "https://meet/x" }]));
        assert!(outcome.is_success());
        assert_eq!(outcome.conferencing_link.as_deref(), Some("https://meet/x"));
    }

    #[test]
    fn json_string_response() {
        let outcome = interpret_response(Value::String(r#"{"status":"success"}"#.into()));
        assert_eq!(outcome.status, ScheduleStatus::Success);
        assert!(outcome.calendar_event_id.is_none());
    }

    #[test]
    fn fenced_output_field() {
        let outcome = interpret_response(json!({
            "output": "```json\n{\"status\":\"success\",\"data\":{\"id\":\"evt3\"},\"conferenceData\":{\"entryPoints\":[{\"uri\":\"https://meet/y\"}]}}\n```"
        }));
        assert!(outcome.is_success());
        assert_eq!(outcome.calendar_event_id.as_deref(), Some("evt3"));
        assert_eq!(outcome.conferencing_link.as_deref(), Some("https://meet/y"));
    }

    #[test]
    fn error_status_keeps_message() {
        let outcome = interpret_response(json!({ "status": "error", "message": "Agenda cheia" }));
        assert!(!outcome.is_success());
        assert_eq!(outcome.message.as_deref(), Some("Agenda cheia"));
    }

    #[test]
    fn unknown_shape_is_error() {
        let outcome = interpret_response(json!(42));
        assert_eq!(outcome.status, ScheduleStatus::Error);
        assert!(interpret_response(json!([])).status == ScheduleStatus::Error);
    }

    #[tokio::test]
    async fn dry_run_always_succeeds() {
        let outcome = DryRunSink.create_meeting(&meeting()).await.unwrap();
        assert!(outcome.is_success());
    }
}
