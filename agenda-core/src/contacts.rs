//! People the user has scheduled with before.
//!
//! The most frequent contacts are offered to the remote model so it can
//! resolve "com a Ana" to an address without asking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgendaResult;

/// How many contacts the prompt lists.
pub const PROMPT_CONTACTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownContact {
    pub email: String,
    pub name: String,
    pub meeting_count: u32,
    pub last_used: DateTime<Utc>,
}

/// Storage for known contacts.
pub trait ContactStore: Send + Sync {
    /// Most used contacts first, ties broken by most recent use.
    fn top(&self, limit: usize) -> Vec<KnownContact>;

    /// Count one more meeting with `email`, refreshing its display name.
    fn record(&mut self, email: &str, name: &str, at: DateTime<Utc>) -> AgendaResult<()>;
}

/// In-memory contact list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactBook {
    contacts: Vec<KnownContact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&KnownContact> {
        let email = email.trim().to_lowercase();
        self.contacts.iter().find(|c| c.email == email)
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    pub fn add(&mut self, email: &str, name: &str, at: DateTime<Utc>) {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return;
        }
        let name = name.trim();
        match self.contacts.iter_mut().find(|c| c.email == email) {
            Some(contact) => {
                contact.meeting_count += 1;
                contact.last_used = at;
                if !name.is_empty() {
                    contact.name = name.to_string();
                }
            }
            None => self.contacts.push(KnownContact {
                name: if name.is_empty() { email.clone() } else { name.to_string() },
                email,
                meeting_count: 1,
                last_used: at,
            }),
        }
    }

    pub fn ranked(&self, limit: usize) -> Vec<KnownContact> {
        let mut ranked = self.contacts.clone();
        ranked.sort_by(|a, b| {
            b.meeting_count
                .cmp(&a.meeting_count)
                .then(b.last_used.cmp(&a.last_used))
        });
        ranked.truncate(limit);
        ranked
    }
}

impl ContactStore for ContactBook {
    fn top(&self, limit: usize) -> Vec<KnownContact> {
        self.ranked(limit)
    }

    fn record(&mut self, email: &str, name: &str, at: DateTime<Utc>) -> AgendaResult<()> {
        self.add(email, name, at);
        Ok(())
    }
}

/// Contact block appended to the system prompt. Empty when there are none.
pub fn format_for_prompt(contacts: &[KnownContact]) -> String {
    if contacts.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = contacts
        .iter()
        .map(|c| format!("- {} ({}) — {} reunião(ões)", c.name, c.email, c.meeting_count))
        .collect();
    format!(
        "\n\n## Contatos frequentes\nQuando o usuário citar alguém pelo nome, use o email correspondente:\n{}",
        lines.join("\n")
    )
}
