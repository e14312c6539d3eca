//! Where confirmed meetings go.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgendaResult;
use crate::meeting::ParsedMeeting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Success,
    Error,
}

/// What the scheduling backend reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub status: ScheduleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conferencing_link: Option<String>,
}

impl ScheduleOutcome {
    pub fn success(calendar_event_id: Option<String>, conferencing_link: Option<String>) -> Self {
        ScheduleOutcome {
            status: ScheduleStatus::Success,
            message: None,
            calendar_event_id,
            conferencing_link,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ScheduleOutcome {
            status: ScheduleStatus::Error,
            message: Some(message.into()),
            calendar_event_id: None,
            conferencing_link: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScheduleStatus::Success
    }
}

/// A backend that creates calendar events.
///
/// Transport problems may be returned as `Err`; callers treat them the same
/// as an `Error` outcome.
#[async_trait]
pub trait SchedulingSink: Send + Sync {
    async fn create_meeting(&self, meeting: &ParsedMeeting) -> AgendaResult<ScheduleOutcome>;
}
