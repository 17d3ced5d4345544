//! # Intent Router
//!
//! Classifies an inbound text message into an [`Intent`] through an explicit,
//! ordered rule table (first match wins), then executes the intent: mutating
//! the conversation store, querying the catalog, and composing the reply.
//! Catalog failures are converted to apologetic replies here and recorded;
//! they never escalate past this module.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use regex::Regex;

use crate::application::composer;
use crate::application::control::BotControl;
use crate::application::store::ConversationStore;
use crate::domain::config::TicketsConfig;
use crate::domain::error::Severity;
use crate::domain::traits::{Catalog, ErrorSink};
use crate::domain::types::{Intent, Reply, Selection, TicketCategory};
use crate::strings::{labels, messages};

/// Extracts the `dd.mm.yyyy` date out of a date-picker button label.
fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}\.\d{2}\.\d{4}").expect("date pattern is valid"))
}

pub struct IntentRouter {
    store: Arc<ConversationStore>,
    catalog: Arc<dyn Catalog>,
    control: Arc<BotControl>,
    errors: Arc<dyn ErrorSink>,
    tickets: TicketsConfig,
}

impl IntentRouter {
    pub fn new(
        store: Arc<ConversationStore>,
        catalog: Arc<dyn Catalog>,
        control: Arc<BotControl>,
        errors: Arc<dyn ErrorSink>,
        tickets: TicketsConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            control,
            errors,
            tickets,
        }
    }

    /// The ordered classification table. Pure: reads the selection snapshot
    /// and the canned table, never mutates anything.
    pub fn classify(
        text: &str,
        selection: Option<&Selection>,
        canned: &HashMap<String, String>,
    ) -> Intent {
        let msg = text.trim();
        let lower = msg.to_lowercase();

        // 1. Category pick. Only a complete date+session selection can show
        //    tariffs; anything else gets nudged back to the date picker.
        if is_category_message(&lower) {
            if let Some(selection) = selection {
                if let Some(session) = selection.session.as_deref().filter(|s| !s.is_empty()) {
                    return Intent::ShowTariffs {
                        date: selection.date.clone(),
                        session: session.to_string(),
                        category: category_from_message(&lower),
                    };
                }
            }
            return Intent::NeedSelection;
        }

        // 2. Fixed menu table.
        match lower.as_str() {
            "/start" | "начать" | "🚀 начать" => return Intent::ShowMainMenu { greet: true },
            "информация" | "ℹ️ информация" => return Intent::ShowInfoMenu,
            "время работы" | "⏰ время работы" => return Intent::ShowWorkingHours,
            "контакты" | "📞 контакты" => return Intent::ShowContacts,
            "назад" | "🔙 назад" | "🔙 в начало" => {
                return Intent::ShowMainMenu { greet: false };
            }
            "🔙 к сеансам" => {
                return match selection {
                    Some(selection) => Intent::ShowSessionsForDate {
                        date: selection.date.clone(),
                        select: false,
                    },
                    None => Intent::ShowDatePicker,
                };
            }
            "билеты" | "🎟 купить билеты" => return Intent::ShowDatePicker,
            "загруженность" | "📊 загруженность" => return Intent::ShowLoad,
            _ => {}
        }

        // 3. Canned command table (hot-reloadable).
        if let Some(reply) = canned.get(&lower) {
            return Intent::CannedReply {
                text: reply.clone(),
            };
        }

        // 4. Date pick.
        if msg.starts_with(labels::DATE_MARKER) {
            if let Some(date) = date_pattern().find(msg) {
                return Intent::ShowSessionsForDate {
                    date: date.as_str().to_string(),
                    select: true,
                };
            }
            return Intent::Unrecognized;
        }

        // 5. Session pick.
        if let Some(rest) = msg.strip_prefix(labels::SESSION_MARKER) {
            let session = rest.trim();
            if !session.is_empty() {
                return match selection {
                    Some(selection) => Intent::AwaitCategory {
                        date: selection.date.clone(),
                        session: session.to_string(),
                    },
                    None => Intent::NeedDate,
                };
            }
        }

        Intent::Unrecognized
    }

    /// Classifies and executes one message. Always produces a Reply.
    pub async fn route(&self, user_id: i64, text: &str) -> Reply {
        let selection = self.store.get(user_id);
        let canned = self.control.canned();
        let intent = Self::classify(text, selection.as_ref(), &canned);
        tracing::info!(user_id, ?intent, "routing message");

        match intent {
            Intent::ShowMainMenu { greet } => {
                if !greet {
                    self.store.clear(user_id);
                }
                composer::main_menu(greet)
            }
            Intent::ShowInfoMenu => composer::info_menu(),
            Intent::ShowWorkingHours => composer::working_hours(),
            Intent::ShowContacts => composer::contacts(),
            Intent::ShowDatePicker => {
                composer::date_picker(&self.tickets, self.today(), messages::PICK_DATE)
            }
            Intent::ShowSessionsForDate { date, select } => {
                if select {
                    self.store.set_date(user_id, &date);
                }
                self.sessions_reply(user_id, &date).await
            }
            Intent::AwaitCategory { date, session } => {
                if self.store.set_session(user_id, &session) {
                    composer::category_prompt(&date, &session)
                } else {
                    // The selection disappeared between classify and here;
                    // same answer as a session pick with no date.
                    self.nudge(messages::NEED_DATE)
                }
            }
            Intent::ShowTariffs {
                date,
                session,
                category,
            } => self.tariffs_reply(user_id, &date, &session, category).await,
            Intent::ShowLoad => self.load_reply(user_id).await,
            Intent::NeedDate => self.nudge(messages::NEED_DATE),
            Intent::NeedSelection => self.nudge(messages::NEED_SELECTION),
            Intent::CannedReply { text } => composer::canned(&text),
            Intent::Unrecognized => composer::unrecognized(),
        }
    }

    async fn sessions_reply(&self, user_id: i64, date: &str) -> Reply {
        match self.catalog.sessions(date).await {
            Ok(sessions) => {
                composer::sessions_list(&self.tickets, self.today(), date, &sessions)
            }
            Err(err) => {
                self.record_catalog(user_id, &err, date);
                Reply::with_keyboard(
                    messages::sessions_failed(date),
                    composer::date_picker_keyboard(&self.tickets, self.today()),
                )
            }
        }
    }

    async fn tariffs_reply(
        &self,
        user_id: i64,
        date: &str,
        session: &str,
        category: TicketCategory,
    ) -> Reply {
        match self.catalog.tariffs(date).await {
            Ok(rates) => composer::tariffs(&self.tickets, date, session, category, &rates),
            Err(err) => {
                self.record_catalog(user_id, &err, date);
                Reply::with_keyboard(messages::TARIFFS_FAILED, composer::back_keyboard())
            }
        }
    }

    async fn load_reply(&self, user_id: i64) -> Reply {
        match self.catalog.current_load().await {
            Ok(load) => composer::park_load(&load),
            Err(err) => {
                self.record_catalog(user_id, &err, "");
                Reply::text_only(messages::LOAD_FAILED)
            }
        }
    }

    fn nudge(&self, prompt: &str) -> Reply {
        composer::date_picker(&self.tickets, self.today(), prompt)
    }

    fn record_catalog(&self, user_id: i64, err: &crate::domain::error::CatalogError, date: &str) {
        self.errors.record(
            Severity::Error,
            err,
            Some(user_id),
            Some(serde_json::json!({
                "operation": err.operation,
                "date": date,
                "selection": self.store.get(user_id).map(|s| format!("{s:?}")),
            })),
        );
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

fn is_category_message(lower: &str) -> bool {
    lower.contains("взрос")
        || lower.contains("детск")
        || lower.contains("adult")
        || lower.contains("child")
        || lower.contains("kids")
        || lower == "👤"
        || lower == "👶"
}

fn category_from_message(lower: &str) -> TicketCategory {
    if lower.contains("взрос") || lower.contains("adult") || lower == "👤" {
        TicketCategory::Adult
    } else {
        TicketCategory::Child
    }
}
