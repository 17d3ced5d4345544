//! # Messages
//!
//! Constant strings and format functions for user-facing replies.

pub const GREETING: &str = "Добро пожаловать! Выберите пункт 👇";
pub const MAIN_MENU: &str = "Главное меню:";
pub const INFO_PROMPT: &str = "Выберите интересующую информацию 👇";
pub const PICK_DATE: &str = "Выберите дату для сеанса:";
pub const NEED_DATE: &str = "Сначала выберите дату 📅";
pub const NEED_SELECTION: &str = "Сначала выберите дату и сеанс 📅";
pub const UNRECOGNIZED: &str = "Я вас не понял, попробуйте еще раз 😅";
pub const APOLOGY: &str = "Произошла ошибка при обработке запроса. Мы уже работаем над этим! 🛠️";

pub const LOAD_FAILED: &str = "Не удалось получить данные о загруженности 😔";
pub const TARIFFS_FAILED: &str = "⚠️ Не удалось загрузить тарифы, попробуйте позже";

pub fn welcome() -> String {
    [
        "🌊 ДОБРО ПОЖАЛОВАТЬ В ЦЕНТР YES!",
        "Я ваш персональный помощник для организации незабываемого отдыха! 🎯",
        "🎟 УМНАЯ ПОКУПКА БИЛЕТОВ - выбор даты, сеанса и тарифов.",
        "📊 ОНЛАЙН-МОНИТОРИНГ ЗАГРУЖЕННОСТИ - реальная картина посещаемости.",
        "ℹ️ ПОЛНАЯ ИНФОРМАЦИЯ О ЦЕНТРЕ - расписание, контакты и т.д.",
        "🚀 Начните прямо сейчас! Выберите раздел в меню ниже.",
    ]
    .join("\n")
}

pub const WORKING_HOURS: &str = "🏢 Режим работы Центра YES\n\n\
🌊 Аквапарк:\n\
• Будние дни: 10:00 - 21:00\n\
• Выходные и праздники: 09:00 - 22:00\n\n\
🍽 Ресторан: 11:00 - 23:00\n\n\
Кассы закрываются за час до окончания работы.";

pub const CONTACTS: &str = "📞 Контакты Центра YES\n\n\
• Основной: (8172) 33-06-06\n\
• Ресторан: 8-800-200-67-71\n\
yes@yes35.ru";

pub fn sessions_failed(date: &str) -> String {
    format!("⚠️ Ошибка при загрузке сеансов на {date}")
}

pub fn no_sessions(date: &str) -> String {
    format!("😔 На {date} нет доступных сеансов.")
}

pub fn no_free_seats(date: &str) -> String {
    format!("😔 На {date} нет свободных мест.")
}

pub fn sessions_header(date: &str) -> String {
    format!("🎟 *Доступные сеансы на {date}:*\n\n")
}

pub fn category_prompt(session: &str, date: &str) -> String {
    format!("🎟 *Сеанс: {session} ({date})*\n\nВыберите категорию билетов:")
}

pub const FEW_SEATS: &str = "🔴 Мало мест!";
pub const SEATS_AVAILABLE: &str = "🟢 Есть места";

pub fn session_line(label: &str, availability: &str, free: i64, total: i64) -> String {
    format!("⏰ *{label}* | {availability}\n   Свободно: {free}/{total} мест\n\n")
}

pub const NO_TARIFFS_IN_CATEGORY: &str =
    "😔 Нет доступных билетов этой категории\n💡 Попробуйте выбрать другую категорию";

pub const TARIFF_NOTES: &str = "\n💡 Примечания:\n\
• Детский билет - для детей от 4 до 12 лет\n\
• Дети до 4 лет - бесплатно (с взрослым)\n\
• VIP билеты включают дополнительные услуги";

pub const BUY_ONLINE: &str = "\n🔗 *Купить онлайн:* yes35.ru";

pub fn load_report(count: i64, load_percent: i64, status: &str) -> String {
    format!(
        "📊 Загруженность аквапарка:\n\n👥 В данный момент: {count} человек\n📈 {load_percent}% ({status})"
    )
}

pub const LOAD_LOW: &str = "Мало людей 🟢";
pub const LOAD_MEDIUM: &str = "Средняя загруженность 🟡";
pub const LOAD_HIGH: &str = "Много людей 🔴";
