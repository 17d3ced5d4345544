//! # Event Dispatcher
//!
//! The failure boundary between the poll loop and everything downstream.
//! Interprets one raw platform event, obtains a Reply, and sends it. Whatever
//! goes wrong inside this path, the user still gets an answer and the error
//! is recorded with the originating event; nothing propagates out of
//! [`EventDispatcher::dispatch`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::application::composer;
use crate::application::router::IntentRouter;
use crate::application::store::ConversationStore;
use crate::domain::error::Severity;
use crate::domain::traits::{ErrorSink, OutboundChat};
use crate::domain::types::{InboundEvent, Reply};

pub struct EventDispatcher {
    router: IntentRouter,
    chat: Arc<dyn OutboundChat>,
    store: Arc<ConversationStore>,
    errors: Arc<dyn ErrorSink>,
}

impl EventDispatcher {
    pub fn new(
        router: IntentRouter,
        chat: Arc<dyn OutboundChat>,
        store: Arc<ConversationStore>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            router,
            chat,
            store,
            errors,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::MessageAllowed { user_id } => {
                // The welcome flow is stateless: no reads, no writes.
                self.deliver(user_id, composer::welcome(), "message_allow")
                    .await;
            }
            InboundEvent::NewMessage { from_id, text } => {
                let reply = self.routed_reply(from_id, &text).await;
                self.deliver(from_id, reply, &text).await;
            }
        }
    }

    /// Runs the router under an unwind guard. A panicking handler is
    /// downgraded to the generic apology so one bad message never takes the
    /// poll loop down with it.
    async fn routed_reply(&self, user_id: i64, text: &str) -> Reply {
        let routed = AssertUnwindSafe(self.router.route(user_id, text))
            .catch_unwind()
            .await;
        match routed {
            Ok(reply) => reply,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                self.errors.record(
                    Severity::Critical,
                    &format!("unhandled dispatch failure: {detail}"),
                    Some(user_id),
                    Some(serde_json::json!({
                        "text": text,
                        "selection": self.store.get(user_id).map(|s| format!("{s:?}")),
                    })),
                );
                composer::apology()
            }
        }
    }

    async fn deliver(&self, user_id: i64, reply: Reply, context: &str) {
        if let Err(err) = self.chat.send(user_id, &reply).await {
            self.errors.record(
                Severity::Error,
                &err,
                Some(user_id),
                Some(serde_json::json!({ "event": context })),
            );
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::application::control::BotControl;
    use crate::domain::config::TicketsConfig;
    use crate::domain::error::{BotError, CatalogError};
    use crate::domain::traits::Catalog;
    use crate::domain::types::{LoadInfo, SessionOption, TariffRate};
    use crate::infrastructure::error_log::ErrorRecorder;
    use crate::strings::messages;

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

    struct PanickingCatalog;

    #[async_trait]
    impl Catalog for PanickingCatalog {
        async fn current_load(&self) -> Result<LoadInfo, CatalogError> {
            panic!("load backend exploded");
        }

        async fn sessions(&self, _date: &str) -> Result<Vec<SessionOption>, CatalogError> {
            panic!("session backend exploded");
        }

        async fn tariffs(&self, _date: &str) -> Result<Vec<TariffRate>, CatalogError> {
            panic!("tariff backend exploded");
        }
    }

    fn dispatcher(
        catalog: Arc<dyn Catalog>,
    ) -> (EventDispatcher, Arc<RecordingChat>, Arc<ConversationStore>, Arc<ErrorRecorder>) {
        let store = Arc::new(ConversationStore::new());
        let control = Arc::new(BotControl::new(
            PathBuf::from("unused.yaml"),
            HashMap::new(),
        ));
        let errors = Arc::new(ErrorRecorder::new(16));
        let chat = Arc::new(RecordingChat::default());
        let router = IntentRouter::new(
            store.clone(),
            catalog,
            control,
            errors.clone(),
            TicketsConfig::default(),
        );
        let dispatcher =
            EventDispatcher::new(router, chat.clone(), store.clone(), errors.clone());
        (dispatcher, chat, store, errors)
    }

    #[tokio::test]
    async fn test_welcome_is_stateless_and_repeatable() {
        let (dispatcher, chat, store, _) = dispatcher(Arc::new(PanickingCatalog));

        dispatcher
            .dispatch(InboundEvent::MessageAllowed { user_id: 7 })
            .await;
        dispatcher
            .dispatch(InboundEvent::MessageAllowed { user_id: 7 })
            .await;

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, sent[1].1);
        assert!(sent[0].1.text.contains("ДОБРО ПОЖАЛОВАТЬ"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_apology() {
        let (dispatcher, chat, _, errors) = dispatcher(Arc::new(PanickingCatalog));

        dispatcher
            .dispatch(InboundEvent::NewMessage {
                from_id: 7,
                text: "📅 18.05.2025".to_string(),
            })
            .await;

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.text, messages::APOLOGY);

        let recorded = errors.recent(10);
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].message.contains("session backend exploded"));
        assert_eq!(recorded[0].user_id, Some(7));
    }

    #[tokio::test]
    async fn test_send_failure_is_recorded_not_propagated() {
        struct RefusingChat;

        #[async_trait]
        impl OutboundChat for RefusingChat {
            async fn send(&self, _user_id: i64, _reply: &Reply) -> Result<(), BotError> {
                Err(BotError::Vk("timeout".to_string()))
            }
        }

        let store = Arc::new(ConversationStore::new());
        let control = Arc::new(BotControl::new(
            PathBuf::from("unused.yaml"),
            HashMap::new(),
        ));
        let errors = Arc::new(ErrorRecorder::new(16));
        let router = IntentRouter::new(
            store.clone(),
            Arc::new(PanickingCatalog),
            control,
            errors.clone(),
            TicketsConfig::default(),
        );
        let dispatcher =
            EventDispatcher::new(router, Arc::new(RefusingChat), store, errors.clone());

        dispatcher
            .dispatch(InboundEvent::MessageAllowed { user_id: 7 })
            .await;

        assert_eq!(errors.recent(10).len(), 1);
    }
}
