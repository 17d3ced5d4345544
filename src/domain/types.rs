//! # Domain Types
//!
//! Events produced by the long-poll feed, the classified intent of an inbound
//! message, per-user conversation state, and the data returned by the catalog
//! service.

use crate::domain::keyboard::Keyboard;

/// A platform event consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The user allowed messages from the group; triggers the welcome flow.
    MessageAllowed { user_id: i64 },
    /// A new text message from a user.
    NewMessage { from_id: i64, text: String },
}

/// Per-user conversation state: the selected date and, once picked, the
/// selected session. An entry exists only after a date pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub date: String,
    pub session: Option<String>,
}

impl Selection {
    pub fn date_only(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            session: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketCategory {
    Adult,
    Child,
}

/// The classified meaning of an inbound message given current conversation
/// state. Derived deterministically by the router's ordered rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `greet` distinguishes the start greeting from "back" navigation;
    /// back navigation also clears the user's selection.
    ShowMainMenu { greet: bool },
    ShowInfoMenu,
    ShowWorkingHours,
    ShowContacts,
    ShowDatePicker,
    /// `select` is false when re-listing for an already stored date
    /// ("back to sessions"), which must not touch the stored selection.
    ShowSessionsForDate { date: String, select: bool },
    AwaitCategory { date: String, session: String },
    ShowTariffs {
        date: String,
        session: String,
        category: TicketCategory,
    },
    ShowLoad,
    /// Session pick arrived with no date on record.
    NeedDate,
    /// Category pick arrived without a complete date+session selection.
    NeedSelection,
    /// Matched the hot-reloadable canned command table.
    CannedReply { text: String },
    Unrecognized,
}

/// One bookable session slot for a given date, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOption {
    /// Display label, e.g. "10:00-12:00".
    pub label: String,
    #[allow(dead_code)]
    pub start_time: String,
    #[allow(dead_code)]
    pub end_time: String,
    pub free_seats: i64,
    pub total_seats: i64,
}

/// A raw tariff entry prior to category classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffRate {
    pub name: String,
    pub price: f64,
}

/// Current occupancy of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadInfo {
    pub count: i64,
    pub load_percent: i64,
}

/// The output unit: display text plus an optional quick-reply keyboard.
/// Never retried or stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// The long-poll session handle: server URL, access key, and cursor.
/// Owned exclusively by the poll loop and replaced wholesale on renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPollCursor {
    pub server: String,
    pub key: String,
    pub ts: String,
}

/// Outcome of a single long-poll fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Events in receipt order plus the advanced cursor position.
    Batch { ts: String, events: Vec<InboundEvent> },
    /// The event history is outdated (`failed: 1`); adopt the returned
    /// cursor and fetch again.
    Resync { ts: String },
}
