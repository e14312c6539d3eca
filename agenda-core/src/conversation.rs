//! Turn-by-turn conversation state.
//!
//! The local pipeline never patches a previous result: every user turn is
//! appended to a running context string and extraction runs again over the
//! whole thing. The remote pipeline instead receives the full turn history.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, AgendaResult};
use crate::intent::{missing_fields_message, parse_meeting};
use crate::meeting::{MissingField, ParsedMeeting};
use crate::remote::RemoteReply;

/// Assistant text recorded when a full proposal is shown.
pub const PROPOSAL_MESSAGE: &str = "Entendi! Confira os dados:";

/// Which extraction pipeline handles user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Local,
    Remote,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => f.write_str("local"),
            Mode::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationState {
    Idle,
    AwaitingInfo,
    Confirming,
    Dispatching,
    Succeeded,
    Failed,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::Idle => "idle",
            ConversationState::AwaitingInfo => "awaiting-info",
            ConversationState::Confirming => "confirming",
            ConversationState::Dispatching => "dispatching",
            ConversationState::Succeeded => "terminal-success",
            ConversationState::Failed => "terminal-error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// What the assistant answers to a user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Required fields are still missing.
    FollowUp {
        message: String,
        missing: Vec<MissingField>,
    },
    /// Every field is present; waiting for confirm or cancel.
    Proposal(ParsedMeeting),
    /// Free-form text from the remote model.
    Message(String),
}

impl Reply {
    /// Text recorded in the transcript for this reply.
    pub fn text(&self) -> &str {
        match self {
            Reply::FollowUp { message, .. } => message,
            Reply::Proposal(_) => PROPOSAL_MESSAGE,
            Reply::Message(text) => text,
        }
    }
}

/// A user turn that has been accepted but not yet answered.
///
/// Carries what the selected pipeline needs. Finishing it after the
/// conversation was reset or switched modes is a no-op.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    epoch: u64,
    /// The new user message.
    pub text: String,
    /// Turns before this one, oldest first.
    pub history: Vec<Turn>,
    /// All user text so far, this turn included.
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    mode: Mode,
    state: ConversationState,
    turns: Vec<Turn>,
    context: String,
    pending: Option<ParsedMeeting>,
    #[serde(default)]
    epoch: u64,
    #[serde(skip)]
    in_flight: bool,
}

impl Conversation {
    pub fn new(mode: Mode) -> Self {
        Conversation {
            mode,
            state: ConversationState::Idle,
            turns: Vec::new(),
            context: String::new(),
            pending: None,
            epoch: 0,
            in_flight: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Space-joined text of every user turn since the last clear.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn pending(&self) -> Option<&ParsedMeeting> {
        self.pending.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Switch pipelines. Any proposal and any unanswered turn are dropped.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        info!("conversation mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.epoch += 1;
        self.in_flight = false;
        self.pending = None;
        if matches!(self.state, ConversationState::Confirming | ConversationState::Dispatching) {
            self.state = ConversationState::AwaitingInfo;
        }
    }

    /// Accept a user message. Only one turn may be in flight at a time.
    pub fn begin_turn(&mut self, text: &str, at: DateTime<Utc>) -> AgendaResult<PendingTurn> {
        if self.in_flight {
            return Err(AgendaError::TurnInFlight);
        }
        self.require_not(ConversationState::Dispatching, "send a message")?;

        let text = text.trim().to_string();
        let history = self.turns.clone();
        self.push_turn(Role::User, &text, at);
        if self.context.is_empty() {
            self.context = text.clone();
        } else {
            self.context = format!("{} {}", self.context, text);
        }
        self.in_flight = true;

        Ok(PendingTurn {
            epoch: self.epoch,
            text,
            history,
            context: self.context.clone(),
        })
    }

    /// Answer a turn with a local extraction result.
    pub fn finish_local(&mut self, turn: PendingTurn, meeting: ParsedMeeting, at: DateTime<Utc>) -> Option<Reply> {
        if !self.accepts(&turn) {
            return None;
        }
        Some(self.apply_meeting(meeting, at))
    }

    /// Answer a turn with what the remote model said.
    pub fn finish_remote(&mut self, turn: PendingTurn, reply: RemoteReply, at: DateTime<Utc>) -> Option<Reply> {
        if !self.accepts(&turn) {
            return None;
        }
        let reply = match reply {
            RemoteReply::Structured(meeting) => self.apply_meeting(meeting, at),
            RemoteReply::Conversational(text) => {
                self.pending = None;
                self.state = ConversationState::AwaitingInfo;
                self.push_turn(Role::Assistant, &text, at);
                Reply::Message(text)
            }
        };
        Some(reply)
    }

    /// Run one full local turn: append, re-extract over the whole context, answer.
    pub fn submit_local(&mut self, text: &str, today: NaiveDate, at: DateTime<Utc>) -> AgendaResult<Reply> {
        let turn = self.begin_turn(text, at)?;
        let meeting = parse_meeting(&turn.context, today);
        self.finish_local(turn, meeting, at).ok_or(AgendaError::StaleTurn)
    }

    /// Accept the pending proposal for scheduling.
    pub fn confirm(&mut self) -> AgendaResult<ParsedMeeting> {
        self.require(ConversationState::Confirming, "confirm")?;
        let meeting = self
            .pending
            .clone()
            .ok_or_else(|| self.transition_error("confirm"))?;
        self.state = ConversationState::Dispatching;
        info!("dispatching meeting '{}'", meeting.title);
        Ok(meeting)
    }

    /// The scheduling sink accepted the meeting. Everything accumulated is cleared.
    pub fn dispatch_succeeded(&mut self) -> AgendaResult<ParsedMeeting> {
        self.require(ConversationState::Dispatching, "complete dispatch")?;
        let meeting = self
            .pending
            .take()
            .ok_or_else(|| self.transition_error("complete dispatch"))?;
        self.turns.clear();
        self.context.clear();
        self.state = ConversationState::Succeeded;
        Ok(meeting)
    }

    /// The scheduling sink rejected the meeting. The proposal is dropped but
    /// the typed context stays so the user does not have to repeat it.
    pub fn dispatch_failed(&mut self) -> AgendaResult<()> {
        self.require(ConversationState::Dispatching, "fail dispatch")?;
        self.pending = None;
        self.state = ConversationState::Failed;
        Ok(())
    }

    /// Discard the pending proposal.
    ///
    /// Local mode starts over from scratch; remote mode keeps the history
    /// because the model holds the conversational memory.
    pub fn cancel(&mut self) -> AgendaResult<()> {
        self.require(ConversationState::Confirming, "cancel")?;
        self.pending = None;
        match self.mode {
            Mode::Local => {
                self.turns.clear();
                self.context.clear();
                self.state = ConversationState::Idle;
            }
            Mode::Remote => self.state = ConversationState::AwaitingInfo,
        }
        Ok(())
    }

    /// Forget everything. Answers to turns started before the reset are discarded.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.context.clear();
        self.pending = None;
        self.state = ConversationState::Idle;
        self.in_flight = false;
        self.epoch += 1;
    }

    /// Keep at most `max_turns` turns newer than `cutoff`, and rebuild the
    /// context from the user turns that remain.
    pub fn prune(&mut self, max_turns: usize, cutoff: DateTime<Utc>) {
        self.turns.retain(|t| t.timestamp > cutoff);
        if self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            self.turns.drain(..excess);
        }
        self.context = self
            .turns
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if self.turns.is_empty() {
            self.pending = None;
            self.state = ConversationState::Idle;
        }
    }

    /// Serialize to an opaque blob for an external store.
    pub fn to_blob(&self) -> AgendaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore from a blob written by `to_blob`.
    ///
    /// A conversation saved mid-dispatch comes back awaiting input, since the
    /// dispatch outcome was never recorded.
    pub fn from_blob(blob: &str) -> AgendaResult<Self> {
        let mut conversation: Conversation = serde_json::from_str(blob)?;
        if conversation.state == ConversationState::Dispatching {
            conversation.pending = None;
            conversation.state = ConversationState::AwaitingInfo;
        }
        Ok(conversation)
    }

    fn accepts(&mut self, turn: &PendingTurn) -> bool {
        if turn.epoch != self.epoch {
            debug!("discarding answer to a turn from a previous conversation");
            return false;
        }
        self.in_flight = false;
        true
    }

    fn apply_meeting(&mut self, meeting: ParsedMeeting, at: DateTime<Utc>) -> Reply {
        let reply = if meeting.ready {
            self.state = ConversationState::Confirming;
            self.pending = Some(meeting.clone());
            Reply::Proposal(meeting)
        } else {
            self.state = ConversationState::AwaitingInfo;
            self.pending = None;
            Reply::FollowUp {
                message: missing_fields_message(&meeting.missing),
                missing: meeting.missing,
            }
        };
        self.push_turn(Role::Assistant, reply.text(), at);
        reply
    }

    fn push_turn(&mut self, role: Role, text: &str, at: DateTime<Utc>) {
        self.turns.push(Turn {
            role,
            text: text.to_string(),
            timestamp: at,
        });
    }

    fn require(&self, state: ConversationState, action: &'static str) -> AgendaResult<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.transition_error(action))
        }
    }

    fn require_not(&self, state: ConversationState, action: &'static str) -> AgendaResult<()> {
        if self.state == state {
            Err(self.transition_error(action))
        } else {
            Ok(())
        }
    }

    fn transition_error(&self, action: &'static str) -> AgendaError {
        AgendaError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Conversation::new(Mode::default())
    }
}
