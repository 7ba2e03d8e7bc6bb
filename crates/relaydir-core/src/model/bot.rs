// ── Bot domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directory entry for one bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub uuid: String,
    /// Contact address used to reach the bot.
    pub address: String,
    pub name: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    /// `None` when the bot has never been probed.
    pub is_online: Option<bool>,
    pub uptime7: f64,
    pub uptime30: f64,
    pub uptime90: f64,
    pub last_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A command the bot advertises in its profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub keyword: String,
    pub label: String,
}

/// Detail record fetched lazily for a single bot: the auto-reply text and
/// the advertised command list, joined from the bot's profile tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDetails {
    pub bot_uuid: String,
    pub reply_message: Option<String>,
    pub commands: Vec<BotCommand>,
}
