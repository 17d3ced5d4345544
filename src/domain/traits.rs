//! # Domain Traits
//!
//! Abstract interfaces for the seams of the system (outbound chat, catalog
//! service, long-poll source, error recording). Allows for pluggable
//! implementations in the Infrastructure layer and plain fakes in tests.

use async_trait::async_trait;

use crate::domain::error::{BotError, CatalogError, Severity};
use crate::domain::types::{LoadInfo, LongPollCursor, PollOutcome, Reply, SessionOption, TariffRate};

/// Outbound side of the messaging platform: delivers one Reply to one user.
#[async_trait]
pub trait OutboundChat: Send + Sync {
    async fn send(&self, user_id: i64, reply: &Reply) -> Result<(), BotError>;
}

/// The external booking/catalog service. All three reads are idempotent and
/// carry no internal retry; failures surface as [`CatalogError`].
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn current_load(&self) -> Result<LoadInfo, CatalogError>;

    /// An absent or empty upstream `result` field is an empty vec, not an error.
    async fn sessions(&self, date: &str) -> Result<Vec<SessionOption>, CatalogError>;

    async fn tariffs(&self, date: &str) -> Result<Vec<TariffRate>, CatalogError>;
}

/// The long-poll event feed: session acquisition and batch fetch.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn acquire(&self) -> Result<LongPollCursor, BotError>;

    /// Blocks up to the server-side hold plus network timeout.
    /// `failed: 2|3` responses surface as [`BotError::Session`].
    async fn fetch(&self, cursor: &LongPollCursor) -> Result<PollOutcome, BotError>;
}

/// Fire-and-forget error recording. Implementations must never let a
/// recording failure affect the caller's control flow.
pub trait ErrorSink: Send + Sync {
    fn record(
        &self,
        severity: Severity,
        error: &dyn std::fmt::Display,
        user_id: Option<i64>,
        context: Option<serde_json::Value>,
    );
}
