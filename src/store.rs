//! JSON files under the data directory: known contacts and the saved
//! conversation.

use std::path::{Path, PathBuf};

use agenda_core::Conversation;
use agenda_core::contacts::{ContactBook, ContactStore, KnownContact};
use agenda_core::error::AgendaResult;
use chrono::{DateTime, Duration, Utc};

/// Turns kept when a conversation is saved and reloaded.
pub const MAX_HISTORY_TURNS: usize = 50;
/// Turns older than this are dropped on reload.
pub const HISTORY_MAX_AGE_HOURS: i64 = 24;

pub fn contacts_path(data_dir: &Path) -> PathBuf {
    data_dir.join("contacts.json")
}

pub fn history_path(data_dir: &Path) -> PathBuf {
    data_dir.join("conversation.json")
}

fn write_file(path: &Path, contents: &str) -> AgendaResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn remove_file(path: &Path) -> AgendaResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// A contact book saved to disk after every change.
pub struct JsonContactStore {
    path: PathBuf,
    book: ContactBook,
}

impl JsonContactStore {
    /// Open the store at `path`. A missing file is an empty book.
    pub fn open(path: PathBuf) -> AgendaResult<Self> {
        let book = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            ContactBook::new()
        };
        Ok(JsonContactStore { path, book })
    }

    pub fn save(&self) -> AgendaResult<()> {
        write_file(&self.path, &serde_json::to_string_pretty(&self.book)?)
    }

    /// Delete the file. Returns whether anything was removed.
    pub fn delete(path: &Path) -> AgendaResult<bool> {
        remove_file(path)
    }
}

impl ContactStore for JsonContactStore {
    fn top(&self, limit: usize) -> Vec<KnownContact> {
        self.book.ranked(limit)
    }

    fn record(&mut self, email: &str, name: &str, at: DateTime<Utc>) -> AgendaResult<()> {
        self.book.add(email, name, at);
        self.save()
    }
}

/// The conversation saved between `agenda chat` sessions.
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: PathBuf) -> Self {
        HistoryFile { path }
    }

    /// Load the saved conversation, keeping only recent turns.
    pub fn load(&self, now: DateTime<Utc>) -> AgendaResult<Option<Conversation>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = std::fs::read_to_string(&self.path)?;
        let mut conversation = Conversation::from_blob(&blob)?;
        conversation.prune(MAX_HISTORY_TURNS, now - Duration::hours(HISTORY_MAX_AGE_HOURS));
        if conversation.turns().is_empty() {
            return Ok(None);
        }
        Ok(Some(conversation))
    }

    pub fn save(&self, conversation: &Conversation) -> AgendaResult<()> {
        write_file(&self.path, &conversation.to_blob()?)
    }

    pub fn clear(&self) -> AgendaResult<bool> {
        remove_file(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::Mode;
    use chrono::{NaiveDate, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
    }

    // --- contacts ---

    #[test]
    fn contacts_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = contacts_path(dir.path());

        let mut store = JsonContactStore::open(path.clone()).unwrap();
        store.record("ana@x.com", "Ana", t0()).unwrap();
        store.record("ana@x.com", "Ana", t0()).unwrap();
        store.record("bia@x.com", "Bia", t0()).unwrap();

        let reopened = JsonContactStore::open(path).unwrap();
        let top = reopened.top(10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].email, "ana@x.com");
        assert_eq!(top[0].meeting_count, 2);
    }

    #[test]
    fn missing_contacts_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonContactStore::open(dir.path().join("nested").join("contacts.json")).unwrap();
        assert!(store.top(10).is_empty());
    }

    #[test]
    fn delete_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = contacts_path(dir.path());
        let mut store = JsonContactStore::open(path.clone()).unwrap();
        store.record("ana@x.com", "Ana", t0()).unwrap();

        assert!(JsonContactStore::delete(&path).unwrap());
        assert!(!JsonContactStore::delete(&path).unwrap());
    }

    // --- history ---

    #[test]
    fn history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(history_path(dir.path()));
        assert!(history.load(t0()).unwrap().is_none());

        let mut conversation = Conversation::new(Mode::Local);
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        conversation.submit_local("com maria@x.com", today, t0()).unwrap();
        history.save(&conversation).unwrap();

        let loaded = history.load(t0() + Duration::hours(1)).unwrap().unwrap();
        assert_eq!(loaded.context(), "com maria@x.com");
        assert_eq!(loaded.turns().len(), 2);
    }

    #[test]
    fn stale_history_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(history_path(dir.path()));

        let mut conversation = Conversation::new(Mode::Local);
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        conversation.submit_local("com maria@x.com", today, t0()).unwrap();
        history.save(&conversation).unwrap();

        assert!(history.load(t0() + Duration::hours(25)).unwrap().is_none());
        assert!(history.clear().unwrap());
    }

    #[test]
    fn history_keeps_last_turns() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryFile::new(history_path(dir.path()));
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let mut conversation = Conversation::new(Mode::Local);
        for i in 0..30 {
            conversation
                .submit_local(&format!("mensagem {i}"), today, t0() + Duration::minutes(i))
                .unwrap();
        }
        history.save(&conversation).unwrap();

        let loaded = history.load(t0() + Duration::hours(1)).unwrap().unwrap();
        assert_eq!(loaded.turns().len(), MAX_HISTORY_TURNS);
    }
}
