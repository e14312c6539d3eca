//! Core of the agenda scheduler.
//!
//! Turns Portuguese free text such as "Call com joao@email.com amanhã às 14h
//! sobre onboarding" into a structured meeting proposal, and keeps the
//! conversation state needed to collect missing fields over several turns:
//! - `intent::parse_meeting` is the deterministic local extractor
//! - `conversation::Conversation` accumulates turns and tracks confirmation
//! - `remote::RemoteAdapter` delegates turns to a chat model behind a circuit breaker
//! - `assistant::Assistant` ties them together with contacts and a scheduling sink

pub mod assistant;
pub mod breaker;
pub mod clock;
pub mod config;
pub mod contacts;
pub mod conversation;
pub mod entities;
pub mod error;
pub mod intent;
pub mod meeting;
pub mod remote;
pub mod sink;
pub mod subject;
pub mod temporal;
pub mod text;

pub use assistant::Assistant;
pub use config::AgendaConfig;
pub use conversation::{Conversation, ConversationState, Mode, Reply, Role, Turn};
pub use error::{AgendaError, AgendaResult};
pub use intent::parse_meeting;
pub use meeting::{MissingField, ParsedMeeting};
pub use sink::{ScheduleOutcome, ScheduleStatus, SchedulingSink};
