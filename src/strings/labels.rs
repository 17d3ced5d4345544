//! # Button Labels
//!
//! Keyboard button labels and message marker glyphs. The router matches
//! inbound text against these, so label and classifier stay in one place.

pub const START: &str = "🚀 Начать";
pub const INFO: &str = "ℹ️ Информация";
pub const BUY_TICKETS: &str = "🎟 Купить билеты";
pub const LOAD: &str = "📊 Загруженность";
pub const WORKING_HOURS: &str = "⏰ Время работы";
pub const CONTACTS: &str = "📞 Контакты";
pub const BACK: &str = "🔙 Назад";
pub const BACK_TO_SESSIONS: &str = "🔙 К сеансам";
pub const BACK_TO_START: &str = "🔙 В начало";
pub const ADULT_TICKETS: &str = "👤 Взрослые билеты";
pub const CHILD_TICKETS: &str = "👶 Детские билеты";
pub const ADULT: &str = "👤 Взрослые";
pub const CHILD: &str = "👶 Детские";
pub const BUY_ON_SITE: &str = "🎟 Купить на сайте";

/// Prefix glyph of date-picker buttons; messages starting with it carry a date.
pub const DATE_MARKER: &str = "📅";
/// Prefix glyph of session buttons; messages starting with it carry a session.
pub const SESSION_MARKER: &str = "⏰";

pub fn date_button(date: &str) -> String {
    format!("{DATE_MARKER} {date}")
}

pub fn session_button(session: &str) -> String {
    format!("{SESSION_MARKER} {session}")
}
