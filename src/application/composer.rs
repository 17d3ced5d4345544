//! # Reply Composer
//!
//! Pure functions turning domain data (sessions, tariffs, load) into display
//! text plus a keyboard description. No I/O happens here; callers fetch the
//! data and pass `today` in where dates are involved, which keeps every
//! function deterministic.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::domain::config::TicketsConfig;
use crate::domain::keyboard::{Button, ButtonColor, Keyboard};
use crate::domain::types::{LoadInfo, Reply, SessionOption, TariffRate, TicketCategory};
use crate::strings::{labels, messages};

/// Price above which a tariff gets the VIP badge.
const VIP_PRICE_BAND: f64 = 2000.0;
/// Buttons per date-picker row.
const DATE_ROW_WIDTH: usize = 3;

pub fn welcome() -> Reply {
    let keyboard =
        Keyboard::new(true).row(vec![Button::text(labels::START, ButtonColor::Positive)]);
    Reply::with_keyboard(messages::welcome(), keyboard)
}

pub fn main_menu(greet: bool) -> Reply {
    let text = if greet {
        messages::GREETING
    } else {
        messages::MAIN_MENU
    };
    Reply::with_keyboard(text, main_menu_keyboard())
}

pub fn info_menu() -> Reply {
    let keyboard = Keyboard::new(false)
        .row(vec![
            Button::text(labels::WORKING_HOURS, ButtonColor::Primary),
            Button::text(labels::CONTACTS, ButtonColor::Primary),
        ])
        .row(vec![Button::text(labels::BACK, ButtonColor::Negative)]);
    Reply::with_keyboard(messages::INFO_PROMPT, keyboard)
}

pub fn working_hours() -> Reply {
    Reply::text_only(messages::WORKING_HOURS)
}

pub fn contacts() -> Reply {
    Reply::text_only(messages::CONTACTS)
}

/// The date picker: the next `picker_days` calendar days starting today,
/// three buttons per row, plus a back button.
pub fn date_picker(config: &TicketsConfig, today: NaiveDate, prompt: &str) -> Reply {
    Reply::with_keyboard(prompt, date_picker_keyboard(config, today))
}

pub fn canned(text: &str) -> Reply {
    Reply::text_only(text)
}

pub fn unrecognized() -> Reply {
    Reply::text_only(messages::UNRECOGNIZED)
}

pub fn apology() -> Reply {
    Reply::text_only(messages::APOLOGY)
}

/// Lists sessions for a date, omitting sold-out ones and flagging sessions
/// with fewer free seats than the threshold. A day with no qualifying
/// sessions re-offers the date picker.
pub fn sessions_list(
    config: &TicketsConfig,
    today: NaiveDate,
    date: &str,
    sessions: &[SessionOption],
) -> Reply {
    if sessions.is_empty() {
        return date_picker(config, today, &messages::no_sessions(date));
    }

    let mut text = messages::sessions_header(date);
    let mut keyboard = Keyboard::new(true);
    let mut listed = 0;

    for session in sessions {
        if session.free_seats == 0 {
            continue;
        }
        let availability = if session.free_seats < config.few_seats_threshold {
            messages::FEW_SEATS
        } else {
            messages::SEATS_AVAILABLE
        };
        text.push_str(&messages::session_line(
            &session.label,
            availability,
            session.free_seats,
            session.total_seats,
        ));
        keyboard = keyboard.row(vec![Button::text(
            labels::session_button(&session.label),
            ButtonColor::Primary,
        )]);
        listed += 1;
    }

    if listed == 0 {
        return date_picker(config, today, &messages::no_free_seats(date));
    }

    keyboard = keyboard.row(vec![Button::text(labels::BACK, ButtonColor::Negative)]);
    Reply::with_keyboard(text, keyboard)
}

pub fn category_prompt(date: &str, session: &str) -> Reply {
    let keyboard = Keyboard::new(true)
        .row(vec![
            Button::text(labels::ADULT_TICKETS, ButtonColor::Primary),
            Button::text(labels::CHILD_TICKETS, ButtonColor::Positive),
        ])
        .row(vec![Button::text(labels::BACK, ButtonColor::Negative)]);
    Reply::with_keyboard(messages::category_prompt(session, date), keyboard)
}

/// Formats the tariffs of one category: classified, deduplicated, grouped by
/// display name, most expensive first, badged by price band.
pub fn tariffs(
    config: &TicketsConfig,
    date: &str,
    session: &str,
    category: TicketCategory,
    rates: &[TariffRate],
) -> Reply {
    let title = match category {
        TicketCategory::Adult => "👤 ВЗРОСЛЫЕ БИЛЕТЫ",
        TicketCategory::Child => "👶 ДЕТСКИЕ БИЛЕТЫ",
    };
    let mut text = format!("🎟 *{title}*\n⏰ Сеанс: {session}\n📅 Дата: {date}\n\n");

    let grouped = select_tariffs(rates, category, config.adult_price_threshold);
    if grouped.is_empty() {
        text.push_str(messages::NO_TARIFFS_IN_CATEGORY);
    } else {
        for (name, price) in &grouped {
            let badge = if *price > VIP_PRICE_BAND {
                "💎 VIP"
            } else if *price > config.adult_price_threshold {
                "⭐ Стандарт"
            } else {
                "🎫 Эконом"
            };
            text.push_str(&format!("{badge} *{name}*: {}₽\n", format_price(*price)));
        }
        text.push_str(messages::TARIFF_NOTES);
    }
    text.push_str(messages::BUY_ONLINE);

    let (adult_color, child_color) = match category {
        TicketCategory::Adult => (ButtonColor::Positive, ButtonColor::Primary),
        TicketCategory::Child => (ButtonColor::Primary, ButtonColor::Positive),
    };
    let keyboard = Keyboard::new(false)
        .row(vec![Button::link(&config.purchase_url, labels::BUY_ON_SITE)])
        .row(vec![
            Button::text(labels::ADULT, adult_color),
            Button::text(labels::CHILD, child_color),
        ])
        .row(vec![
            Button::text(labels::BACK_TO_SESSIONS, ButtonColor::Secondary),
            Button::text(labels::BACK_TO_START, ButtonColor::Negative),
        ]);

    Reply::with_keyboard(text, keyboard)
}

pub fn park_load(load: &LoadInfo) -> Reply {
    let status = if load.load_percent < 30 {
        messages::LOAD_LOW
    } else if load.load_percent < 70 {
        messages::LOAD_MEDIUM
    } else {
        messages::LOAD_HIGH
    };
    Reply::text_only(messages::load_report(load.count, load.load_percent, status))
}

pub fn back_keyboard() -> Keyboard {
    Keyboard::new(true).row(vec![Button::text(labels::BACK, ButtonColor::Negative)])
}

pub fn date_picker_keyboard(config: &TicketsConfig, today: NaiveDate) -> Keyboard {
    let mut keyboard = Keyboard::new(true);
    let mut row = Vec::new();
    for offset in 0..config.picker_days {
        let date = today + Duration::days(offset as i64);
        let label = labels::date_button(&date.format("%d.%m.%Y").to_string());
        row.push(Button::text(label, ButtonColor::Primary));
        if row.len() == DATE_ROW_WIDTH {
            keyboard = keyboard.row(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        keyboard = keyboard.row(row);
    }
    keyboard.row(vec![Button::text(labels::BACK, ButtonColor::Negative)])
}

fn main_menu_keyboard() -> Keyboard {
    Keyboard::new(false).row(vec![
        Button::text(labels::INFO, ButtonColor::Primary),
        Button::text(labels::BUY_TICKETS, ButtonColor::Positive),
        Button::text(labels::LOAD, ButtonColor::Secondary),
    ])
}

/// Classifies one tariff by name markers and the price threshold.
/// Entries matching neither category, or both, are excluded by the caller.
pub fn classify_tariff(name: &str, price: f64, adult_threshold: f64) -> Option<TicketCategory> {
    let n = name.to_lowercase();
    let is_adult = n.contains("взрос")
        || n.contains("adult")
        || (n.contains("вип") && !n.contains("дет"))
        || (n.contains("vip") && !n.contains("дет"))
        || (n.contains("взр") && !n.contains("дет"))
        || (price > adult_threshold && !n.contains("дет"));
    let is_child = n.contains("детск")
        || n.contains("child")
        || n.contains("kids")
        || n.contains("дет")
        || (price < adult_threshold && n.contains("билет") && !n.contains("взр"));

    match (is_adult, is_child) {
        (true, false) => Some(TicketCategory::Adult),
        (false, true) => Some(TicketCategory::Child),
        _ => None,
    }
}

/// Strips category words from a tariff name for display and grouping.
pub fn format_ticket_name(name: &str) -> String {
    let stripped = name
        .replace("Билет", "")
        .replace("билет", "")
        .replace("Вип", "VIP")
        .replace("вип", "VIP")
        .replace("Взрослый", "")
        .replace("взрослый", "")
        .replace("Детский", "")
        .replace("детский", "")
        .replace("весь день", "Весь день")
        .replace("вечерний", "Вечерний");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "Стандартный".to_string()
    } else {
        collapsed
    }
}

/// Dedup on normalized name+price, keep the requested category, group by
/// display name (first entry wins), sort by price descending.
fn select_tariffs(
    rates: &[TariffRate],
    category: TicketCategory,
    adult_threshold: f64,
) -> Vec<(String, f64)> {
    let mut seen = HashSet::new();
    let mut filtered = Vec::new();
    for rate in rates {
        if rate.name.is_empty() {
            continue;
        }
        let key = format!("{}_{}", rate.name.to_lowercase(), rate.price);
        if !seen.insert(key) {
            continue;
        }
        if classify_tariff(&rate.name, rate.price, adult_threshold) == Some(category) {
            filtered.push((rate.name.clone(), rate.price));
        }
    }

    let mut seen_names = HashSet::new();
    let mut grouped: Vec<(String, f64)> = Vec::new();
    for (name, price) in filtered {
        let display = format_ticket_name(&name);
        if seen_names.insert(display.clone()) {
            grouped.push((display, price));
        }
    }
    grouped.sort_by(|a, b| b.1.total_cmp(&a.1));
    grouped
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TicketsConfig {
        TicketsConfig::default()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 16).unwrap()
    }

    fn session(label: &str, free: i64, total: i64) -> SessionOption {
        SessionOption {
            label: label.to_string(),
            start_time: String::new(),
            end_time: String::new(),
            free_seats: free,
            total_seats: total,
        }
    }

    fn rate(name: &str, price: f64) -> TariffRate {
        TariffRate {
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn test_classify_adult_by_marker() {
        assert_eq!(
            classify_tariff("Взрослый VIP", 2500.0, 1000.0),
            Some(TicketCategory::Adult)
        );
    }

    #[test]
    fn test_classify_child_by_marker() {
        assert_eq!(
            classify_tariff("Детский", 400.0, 1000.0),
            Some(TicketCategory::Child)
        );
    }

    #[test]
    fn test_classify_adult_by_price_threshold() {
        assert_eq!(
            classify_tariff("Билет", 1500.0, 1000.0),
            Some(TicketCategory::Adult)
        );
    }

    #[test]
    fn test_classify_plain_cheap_ticket_as_child() {
        assert_eq!(
            classify_tariff("Билет утренний", 600.0, 1000.0),
            Some(TicketCategory::Child)
        );
    }

    #[test]
    fn test_classify_ambiguous_is_excluded() {
        // Carries both an adult and a child marker: matches neither cleanly.
        assert_eq!(
            classify_tariff("Семейный (взрослый + детский)", 1500.0, 1000.0),
            None
        );
    }

    #[test]
    fn test_child_marker_defeats_price_rule() {
        assert_eq!(
            classify_tariff("Детский VIP", 2500.0, 1000.0),
            Some(TicketCategory::Child)
        );
    }

    #[test]
    fn test_duplicate_tariffs_collapse() {
        let rates = vec![
            rate("Взрослый", 1500.0),
            rate("взрослый", 1500.0),
            rate("Взрослый", 1500.0),
        ];
        let reply = tariffs(&config(), "18.05.2025", "10:00-12:00", TicketCategory::Adult, &rates);
        assert_eq!(reply.text.matches("1500₽").count(), 1);
    }

    #[test]
    fn test_tariffs_sorted_by_price_descending() {
        let rates = vec![rate("Взрослый вечерний", 1200.0), rate("Взрослый VIP", 2500.0)];
        let reply = tariffs(&config(), "18.05.2025", "10:00-12:00", TicketCategory::Adult, &rates);
        let vip = reply.text.find("2500₽").unwrap();
        let evening = reply.text.find("1200₽").unwrap();
        assert!(vip < evening);
        assert!(reply.text.contains("💎 VIP"));
        assert!(reply.text.contains("⭐ Стандарт"));
    }

    #[test]
    fn test_tariffs_keyboard_has_link_and_navigation() {
        let reply = tariffs(
            &config(),
            "18.05.2025",
            "10:00-12:00",
            TicketCategory::Adult,
            &[rate("Взрослый", 1500.0)],
        );
        let keyboard = reply.keyboard.unwrap();
        assert_eq!(keyboard.buttons.len(), 3);
        assert!(!keyboard.one_time);
    }

    #[test]
    fn test_empty_category_still_offers_purchase_link() {
        let reply = tariffs(
            &config(),
            "18.05.2025",
            "10:00-12:00",
            TicketCategory::Child,
            &[rate("Взрослый", 1500.0)],
        );
        assert!(reply.text.contains("Нет доступных билетов"));
        assert!(reply.text.contains("yes35.ru"));
    }

    #[test]
    fn test_sold_out_sessions_are_omitted() {
        let sessions = vec![session("10:00-12:00", 25, 40), session("12:00-14:00", 0, 40)];
        let reply = sessions_list(&config(), today(), "18.05.2025", &sessions);
        assert!(reply.text.contains("10:00-12:00"));
        assert!(!reply.text.contains("12:00-14:00"));
    }

    #[test]
    fn test_few_seats_flagged() {
        let sessions = vec![session("10:00-12:00", 3, 40)];
        let reply = sessions_list(&config(), today(), "18.05.2025", &sessions);
        assert!(reply.text.contains(messages::FEW_SEATS));
    }

    #[test]
    fn test_all_sold_out_reoffers_date_picker() {
        let sessions = vec![session("10:00-12:00", 0, 40)];
        let reply = sessions_list(&config(), today(), "18.05.2025", &sessions);
        assert_eq!(reply.text, messages::no_free_seats("18.05.2025"));
        // The date picker: two date rows plus a back row.
        assert_eq!(reply.keyboard.unwrap().buttons.len(), 3);
    }

    #[test]
    fn test_empty_day_reoffers_date_picker() {
        let reply = sessions_list(&config(), today(), "18.05.2025", &[]);
        assert_eq!(reply.text, messages::no_sessions("18.05.2025"));
        assert!(reply.keyboard.is_some());
    }

    #[test]
    fn test_date_picker_spans_five_days() {
        let reply = date_picker(&config(), today(), messages::PICK_DATE);
        let keyboard = reply.keyboard.unwrap();
        assert_eq!(keyboard.buttons.len(), 3);
        assert_eq!(keyboard.buttons[0].len(), 3);
        assert_eq!(keyboard.buttons[1].len(), 2);

        let labels: Vec<String> = keyboard.buttons[..2]
            .iter()
            .flatten()
            .map(|b| match &b.action {
                crate::domain::keyboard::ButtonAction::Text { label } => label.clone(),
                _ => panic!("date picker has only text buttons"),
            })
            .collect();
        assert_eq!(labels[0], "📅 16.05.2025");
        assert_eq!(labels[4], "📅 20.05.2025");
    }

    #[test]
    fn test_load_bands() {
        assert!(park_load(&LoadInfo { count: 12, load_percent: 10 })
            .text
            .contains(messages::LOAD_LOW));
        assert!(park_load(&LoadInfo { count: 80, load_percent: 45 })
            .text
            .contains(messages::LOAD_MEDIUM));
        assert!(park_load(&LoadInfo { count: 300, load_percent: 92 })
            .text
            .contains(messages::LOAD_HIGH));
    }

    #[test]
    fn test_format_ticket_name_strips_category_words() {
        assert_eq!(format_ticket_name("Взрослый билет весь день"), "Весь день");
        assert_eq!(format_ticket_name("Вип билет"), "VIP");
        assert_eq!(format_ticket_name("Детский"), "Стандартный");
    }
}
