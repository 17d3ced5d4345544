//! # Poll Loop
//!
//! Owns the long-poll session: acquires the server/key/cursor triple, fetches
//! event batches, hands them to the dispatcher in receipt order, and survives
//! transient failures with a fixed backoff. Events for one user are always
//! processed sequentially because the whole batch is dispatched sequentially.
//!
//! An operator "stop" only flips the active flag; the loop keeps running so
//! cancellation stays prompt, it just skips fetching.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::control::BotControl;
use crate::application::dispatcher::EventDispatcher;
use crate::domain::config::AppConfig;
use crate::domain::error::{BotError, Severity};
use crate::domain::traits::{ErrorSink, UpdateSource};
use crate::domain::types::{LongPollCursor, PollOutcome};

/// How often the paused loop wakes to re-check the active flag.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct PollLoop {
    source: Arc<dyn UpdateSource>,
    dispatcher: EventDispatcher,
    control: Arc<BotControl>,
    errors: Arc<dyn ErrorSink>,
    backoff: Duration,
    has_token: bool,
    has_group: bool,
}

impl PollLoop {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn UpdateSource>,
        dispatcher: EventDispatcher,
        control: Arc<BotControl>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            source,
            dispatcher,
            control,
            errors,
            backoff: Duration::from_secs(config.vk.retry_backoff),
            has_token: !config.vk.access_token.is_empty(),
            has_group: !config.vk.group_id.is_empty(),
        }
    }

    /// Blocks the calling task until cancellation. Only a configuration
    /// error makes this return `Err`; everything else is retried or handed
    /// to the error sink.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BotError> {
        if !self.has_token {
            let err = BotError::Configuration(
                "vk.access_token is not set; configure it or export VK_ACCESS_TOKEN".to_string(),
            );
            tracing::error!(%err, "refusing to start");
            self.errors.record(
                Severity::Fatal,
                &err,
                None,
                Some(serde_json::json!({ "component": "poll_loop" })),
            );
            return Err(err);
        }
        if !self.has_group {
            tracing::warn!("vk.group_id is not configured; long-poll acquisition may fail");
        }

        let Some(mut cursor) = self.acquire_session(&cancel).await? else {
            return Ok(());
        };
        tracing::info!("long-poll session acquired, listening for events");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if !self.control.is_active() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(PAUSE_POLL_INTERVAL) => continue,
                }
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.source.fetch(&cursor) => outcome,
            };

            match outcome {
                Ok(PollOutcome::Batch { ts, events }) => {
                    // Advance even on an empty batch; the cursor is the
                    // platform's, not ours.
                    cursor.ts = ts;
                    for event in events {
                        self.dispatcher.dispatch(event).await;
                    }
                }
                Ok(PollOutcome::Resync { ts }) => {
                    tracing::warn!("long-poll history outdated, adopting fresh cursor");
                    cursor.ts = ts;
                }
                Err(BotError::Session(reason)) => {
                    tracing::warn!(%reason, "long-poll session invalid, re-acquiring");
                    self.errors.record(
                        Severity::Warning,
                        &format!("long-poll session invalid: {reason}"),
                        None,
                        Some(serde_json::json!({ "component": "poll_loop" })),
                    );
                    match self.acquire_session(&cancel).await? {
                        Some(fresh) => cursor = fresh,
                        None => break,
                    }
                }
                Err(err) => {
                    tracing::error!(%err, "long-poll fetch failed, backing off");
                    self.errors.record(
                        Severity::Critical,
                        &err,
                        None,
                        Some(serde_json::json!({ "component": "poll_loop" })),
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.backoff) => {}
                    }
                }
            }
        }

        tracing::info!("poll loop stopped");
        Ok(())
    }

    /// Acquires a fresh session, retrying transient failures with the fixed
    /// backoff. Returns `Ok(None)` when cancelled while waiting; rejected
    /// credentials are a configuration error and abort the loop.
    async fn acquire_session(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<LongPollCursor>, BotError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            match self.source.acquire().await {
                Ok(cursor) => return Ok(Some(cursor)),
                Err(err @ BotError::Configuration(_)) => {
                    tracing::error!(%err, "long-poll session acquisition rejected");
                    self.errors.record(
                        Severity::Fatal,
                        &err,
                        None,
                        Some(serde_json::json!({ "component": "poll_loop" })),
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(%err, "long-poll session acquisition failed, backing off");
                    self.errors.record(
                        Severity::Critical,
                        &err,
                        None,
                        Some(serde_json::json!({ "component": "poll_loop" })),
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(self.backoff) => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::application::control::BotControl;
    use crate::application::router::IntentRouter;
    use crate::application::store::ConversationStore;
    use crate::domain::config::TicketsConfig;
    use crate::domain::error::CatalogError;
    use crate::domain::traits::{Catalog, OutboundChat};
    use crate::domain::types::{InboundEvent, LoadInfo, Reply, SessionOption, TariffRate};
    use crate::infrastructure::error_log::ErrorRecorder;

    struct NullCatalog;

    #[async_trait]
    impl Catalog for NullCatalog {
        async fn current_load(&self) -> Result<LoadInfo, CatalogError> {
            Err(CatalogError::new("current-load", "not wired"))
        }
        async fn sessions(&self, _date: &str) -> Result<Vec<SessionOption>, CatalogError> {
            Err(CatalogError::new("sessions", "not wired"))
        }
        async fn tariffs(&self, _date: &str) -> Result<Vec<TariffRate>, CatalogError> {
            Err(CatalogError::new("tariffs", "not wired"))
        }
    }

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<(i64, Reply)>>,
    }

    #[async_trait]
    impl OutboundChat for RecordingChat {
        async fn send(&self, user_id: i64, reply: &Reply) -> Result<(), BotError> {
            self.sent.lock().unwrap().push((user_id, reply.clone()));
            Ok(())
        }
    }

    /// Fails the first `failures` fetches, then delivers one batch and
    /// cancels the loop.
    struct FlakySource {
        failures: usize,
        acquisitions: AtomicUsize,
        fetches: AtomicUsize,
        session_errors: usize,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl UpdateSource for FlakySource {
        async fn acquire(&self) -> Result<LongPollCursor, BotError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(LongPollCursor {
                server: "https://lp.example".to_string(),
                key: "key".to_string(),
                ts: "1".to_string(),
            })
        }

        async fn fetch(&self, cursor: &LongPollCursor) -> Result<PollOutcome, BotError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(BotError::Transient("connection reset".to_string()));
            }
            if n < self.failures + self.session_errors {
                return Err(BotError::Session("key expired".to_string()));
            }
            self.cancel.cancel();
            Ok(PollOutcome::Batch {
                ts: format!("{}1", cursor.ts),
                events: vec![InboundEvent::MessageAllowed { user_id: 7 }],
            })
        }
    }

    fn harness(
        source: Arc<dyn UpdateSource>,
    ) -> (PollLoop, Arc<ConversationStore>, Arc<RecordingChat>) {
        let mut config = AppConfig::default();
        config.vk.access_token = "token".to_string();
        config.vk.group_id = "1".to_string();
        config.vk.retry_backoff = 0;

        let store = Arc::new(ConversationStore::new());
        let control = Arc::new(BotControl::new(
            PathBuf::from("unused.yaml"),
            HashMap::new(),
        ));
        let errors = Arc::new(ErrorRecorder::new(32));
        let chat = Arc::new(RecordingChat::default());
        let router = IntentRouter::new(
            store.clone(),
            Arc::new(NullCatalog),
            control.clone(),
            errors.clone(),
            TicketsConfig::default(),
        );
        let dispatcher =
            EventDispatcher::new(router, chat.clone(), store.clone(), errors.clone());
        let poll = PollLoop::new(&config, source, dispatcher, control, errors);
        (poll, store, chat)
    }

    #[tokio::test]
    async fn test_missing_token_is_fatal() {
        let cancel = CancellationToken::new();
        let source = Arc::new(FlakySource {
            failures: 0,
            acquisitions: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            session_errors: 0,
            cancel: cancel.clone(),
        });
        let (mut poll, _, _) = harness(source.clone());
        poll.has_token = false;

        let err = poll.run(cancel).await.unwrap_err();
        assert!(matches!(err, BotError::Configuration(_)));
        assert_eq!(source.acquisitions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_the_loop() {
        struct RejectedSource;

        #[async_trait]
        impl UpdateSource for RejectedSource {
            async fn acquire(&self) -> Result<LongPollCursor, BotError> {
                Err(BotError::Configuration(
                    "vk rejected the credentials".to_string(),
                ))
            }

            async fn fetch(&self, _cursor: &LongPollCursor) -> Result<PollOutcome, BotError> {
                unreachable!("fetch must not be called without a session");
            }
        }

        let (poll, _, _) = harness(Arc::new(RejectedSource));
        let err = poll.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, BotError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let cancel = CancellationToken::new();
        let source = Arc::new(FlakySource {
            failures: 3,
            acquisitions: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            session_errors: 0,
            cancel: cancel.clone(),
        });
        let (poll, store, chat) = harness(source.clone());

        poll.run(cancel).await.unwrap();

        // Three failed fetches, then the delivered batch.
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(chat.sent.lock().unwrap().len(), 1);
        // The failures never touched conversation state.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_session_error_reacquires() {
        let cancel = CancellationToken::new();
        let source = Arc::new(FlakySource {
            failures: 0,
            acquisitions: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            session_errors: 1,
            cancel: cancel.clone(),
        });
        let (poll, _, chat) = harness(source.clone());

        poll.run(cancel).await.unwrap();

        assert_eq!(source.acquisitions.load(Ordering::SeqCst), 2);
        assert_eq!(chat.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_loop_skips_fetching() {
        let cancel = CancellationToken::new();
        let source = Arc::new(FlakySource {
            failures: 0,
            acquisitions: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            session_errors: 0,
            cancel: cancel.clone(),
        });
        let (poll, store, chat) = harness(source.clone());
        poll.control.stop();

        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move { poll.run(run_cancel).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert!(chat.sent.lock().unwrap().is_empty());
        assert!(store.is_empty());
    }
}
