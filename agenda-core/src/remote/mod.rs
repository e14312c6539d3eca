pub mod prompt;
pub mod protocol;
pub mod reply;

pub use protocol::{ChatMessage, ChatTransport};
pub use reply::{RemoteReply, parse_reply};

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use log::{debug, warn};

use crate::breaker::SharedBreaker;
use crate::contacts::KnownContact;
use crate::conversation::Turn;
use crate::error::{AgendaError, AgendaResult};

/// Talks to the remote model through a transport, behind a circuit breaker.
pub struct RemoteAdapter {
    transport: Arc<dyn ChatTransport>,
    breaker: SharedBreaker,
    timezone: String,
}

impl RemoteAdapter {
    pub fn new(transport: Arc<dyn ChatTransport>, breaker: SharedBreaker, timezone: impl Into<String>) -> Self {
        RemoteAdapter {
            transport,
            breaker,
            timezone: timezone.into(),
        }
    }

    pub fn breaker(&self) -> &SharedBreaker {
        &self.breaker
    }

    /// Send one user message with the prior history.
    ///
    /// Fails fast without touching the network while the breaker is open.
    /// Transport errors and empty replies count as failures.
    pub async fn chat(
        &self,
        history: &[Turn],
        message: &str,
        now: DateTime<FixedOffset>,
        contacts: &[KnownContact],
    ) -> AgendaResult<RemoteReply> {
        self.breaker.lock().check()?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt::system_prompt(now, &self.timezone, contacts)));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(message));
        debug!("sending {} message(s) to remote model", messages.len());

        let result = match self.transport.complete(&messages).await {
            Ok(content) if content.trim().is_empty() => Err(AgendaError::RemoteEmpty),
            other => other,
        };

        match result {
            Ok(content) => {
                self.breaker.lock().record_success();
                Ok(parse_reply(&content, now.date_naive()))
            }
            Err(e) => {
                warn!("remote model call failed: {}", e);
                self.breaker.lock().record_failure();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitBreaker;
    use crate::clock::{Clock, ManualClock};
    use crate::conversation::Role;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Replays canned answers and remembers what it was sent.
    struct ScriptedTransport {
        answers: Mutex<Vec<AgendaResult<String>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedTransport {
        fn new(answers: Vec<AgendaResult<String>>) -> Arc<Self> {
            Arc::new(ScriptedTransport {
                answers: Mutex::new(answers),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn complete(&self, messages: &[ChatMessage]) -> AgendaResult<String> {
            self.seen.lock().push(messages.to_vec());
            let mut answers = self.answers.lock();
            if answers.is_empty() {
                Err(AgendaError::Remote("no scripted answer".into()))
            } else {
                answers.remove(0)
            }
        }
    }

    fn adapter(transport: Arc<ScriptedTransport>) -> (RemoteAdapter, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap().fixed_offset());
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60), Arc::new(clock.clone())).shared();
        (RemoteAdapter::new(transport, breaker, "America/Sao_Paulo"), clock)
    }

    #[tokio::test]
    async fn messages_are_system_history_then_user() {
        let transport = ScriptedTransport::new(vec![Ok("Com quem?".into())]);
        let (adapter, clock) = adapter(transport.clone());
        let history = vec![
            Turn { role: Role::User, text: "oi".into(), timestamp: Utc::now() },
            Turn { role: Role::Assistant, text: "Olá!".into(), timestamp: Utc::now() },
        ];

        let reply = adapter.chat(&history, "quero marcar", clock.now(), &[]).await.unwrap();
        assert_eq!(reply, RemoteReply::Conversational("Com quem?".into()));

        let sent = transport.seen.lock()[0].clone();
        let roles: Vec<Role> = sent.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(sent[3].content, "quero marcar");
    }

    #[tokio::test]
    async fn empty_reply_counts_as_failure() {
        let transport = ScriptedTransport::new(vec![Ok("   ".into())]);
        let (adapter, clock) = adapter(transport);
        let result = adapter.chat(&[], "oi", clock.now(), &[]).await;
        assert!(matches!(result, Err(AgendaError::RemoteEmpty)));
        assert_eq!(adapter.breaker().lock().failures(), 1);
    }

    #[tokio::test]
    async fn open_breaker_skips_network() {
        let transport = ScriptedTransport::new(Vec::new());
        let (adapter, clock) = adapter(transport.clone());

        for _ in 0..3 {
            assert!(adapter.chat(&[], "oi", clock.now(), &[]).await.is_err());
        }
        assert_eq!(transport.calls(), 3);

        clock.advance(Duration::from_secs(30));
        let result = adapter.chat(&[], "oi", clock.now(), &[]).await;
        assert!(matches!(result, Err(AgendaError::RemoteUnavailable(30))));
        assert_eq!(transport.calls(), 3);

        clock.advance(Duration::from_secs(31));
        let _ = adapter.chat(&[], "oi", clock.now(), &[]).await;
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn success_resets_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(AgendaError::Remote("boom".into())),
            Ok("tudo certo".into()),
        ]);
        let (adapter, clock) = adapter(transport);
        assert!(adapter.chat(&[], "oi", clock.now(), &[]).await.is_err());
        assert!(adapter.chat(&[], "oi", clock.now(), &[]).await.is_ok());
        assert_eq!(adapter.breaker().lock().failures(), 0);
    }
}
