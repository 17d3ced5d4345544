//! # Conversation Store
//!
//! Per-user conversation state keyed by user id. Backed by a concurrent map
//! with per-key atomic operations, so unrelated conversations never serialize
//! on a global lock and diagnostic readers can peek at any time.

use dashmap::DashMap;

use crate::domain::types::Selection;

#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: DashMap<i64, Selection>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> Option<Selection> {
        self.entries.get(&user_id).map(|entry| entry.value().clone())
    }

    /// Records a date pick. Overwrites any previous selection and clears the
    /// session: a new date invalidates a session chosen for the old one.
    pub fn set_date(&self, user_id: i64, date: &str) {
        self.entries.insert(user_id, Selection::date_only(date));
    }

    /// Records a session pick. Returns false when no date is on record, in
    /// which case nothing is stored.
    pub fn set_session(&self, user_id: i64, session: &str) -> bool {
        match self.entries.get_mut(&user_id) {
            Some(mut entry) => {
                entry.session = Some(session.to_string());
                true
            }
            None => false,
        }
    }

    pub fn clear(&self, user_id: i64) {
        self.entries.remove(&user_id);
    }

    /// Read by the diagnostics surface.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
