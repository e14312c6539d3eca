//! The scheduling assistant: routes turns to the right pipeline, falls back
//! to local extraction when the remote model is unavailable, and hands
//! confirmed meetings to a sink.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};

use crate::clock::Clock;
use crate::contacts::{ContactStore, PROMPT_CONTACTS};
use crate::conversation::{Conversation, Mode, PendingTurn, Reply};
use crate::error::{AgendaError, AgendaResult};
use crate::intent::parse_meeting;
use crate::remote::RemoteAdapter;
use crate::sink::{ScheduleOutcome, SchedulingSink};

pub struct Assistant {
    conversation: Conversation,
    remote: Option<RemoteAdapter>,
    contacts: Option<Box<dyn ContactStore>>,
    clock: Arc<dyn Clock>,
}

impl Assistant {
    pub fn new(mode: Mode, clock: Arc<dyn Clock>) -> Self {
        Assistant {
            conversation: Conversation::new(mode),
            remote: None,
            contacts: None,
            clock,
        }
    }

    pub fn with_remote(mut self, remote: RemoteAdapter) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_contacts(mut self, contacts: Box<dyn ContactStore>) -> Self {
        self.contacts = Some(contacts);
        self
    }

    /// Resume a saved conversation, keeping the assistant's mode.
    pub fn with_conversation(mut self, mut conversation: Conversation) -> Self {
        conversation.set_mode(self.conversation.mode());
        self.conversation = conversation;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn contacts(&self) -> Option<&dyn ContactStore> {
        self.contacts.as_deref()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.conversation.set_mode(mode);
    }

    /// Handle one user message.
    ///
    /// In remote mode any remote failure, an open breaker included, answers
    /// the turn with local extraction over the accumulated text instead.
    pub async fn send(&mut self, text: &str) -> AgendaResult<Reply> {
        let now = self.clock.now();
        let at = now.with_timezone(&Utc);
        let today = self.clock.today();
        let turn = self.conversation.begin_turn(text, at)?;

        let reply = match (self.conversation.mode(), self.remote.as_ref()) {
            (Mode::Remote, Some(remote)) => {
                let contacts = self
                    .contacts
                    .as_ref()
                    .map(|store| store.top(PROMPT_CONTACTS))
                    .unwrap_or_default();
                match remote.chat(&turn.history, &turn.text, now, &contacts).await {
                    Ok(answer) => self.conversation.finish_remote(turn, answer, at),
                    Err(e) => {
                        warn!("{}; answering with local extraction", e);
                        finish_locally(&mut self.conversation, turn, today, at)
                    }
                }
            }
            (Mode::Remote, None) => {
                warn!("{}; answering with local extraction", AgendaError::RemoteNotConfigured);
                finish_locally(&mut self.conversation, turn, today, at)
            }
            (Mode::Local, _) => finish_locally(&mut self.conversation, turn, today, at),
        };

        reply.ok_or(AgendaError::StaleTurn)
    }

    /// Dispatch the pending proposal.
    ///
    /// On success the conversation is cleared and every participant is
    /// recorded as a known contact. On failure the proposal is dropped and
    /// the typed context kept.
    pub async fn confirm(&mut self, sink: &dyn SchedulingSink) -> AgendaResult<ScheduleOutcome> {
        let meeting = self.conversation.confirm()?;

        let outcome = match sink.create_meeting(&meeting).await {
            Ok(outcome) => outcome,
            Err(e) => ScheduleOutcome::error(e.to_string()),
        };

        if outcome.is_success() {
            self.conversation.dispatch_succeeded()?;
            info!("scheduled '{}' with {} participant(s)", meeting.title, meeting.participants.len());
            let at: DateTime<Utc> = self.clock.now().with_timezone(&Utc);
            if let Some(store) = self.contacts.as_mut() {
                for (email, name) in meeting.attendees() {
                    if let Err(e) = store.record(email, name, at) {
                        warn!("could not remember contact {}: {}", email, e);
                    }
                }
            }
        } else {
            warn!(
                "scheduling failed: {}",
                outcome.message.as_deref().unwrap_or("unknown error")
            );
            self.conversation.dispatch_failed()?;
        }
        Ok(outcome)
    }

    pub fn cancel(&mut self) -> AgendaResult<()> {
        self.conversation.cancel()
    }

    pub fn reset(&mut self) {
        self.conversation.reset();
    }
}

/// Answer a turn by re-extracting over everything typed so far.
fn finish_locally(
    conversation: &mut Conversation,
    turn: PendingTurn,
    today: NaiveDate,
    at: DateTime<Utc>,
) -> Option<Reply> {
    let meeting = parse_meeting(&turn.context, today);
    conversation.finish_local(turn, meeting, at)
}
