// ── Status event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical probe result for a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub uuid: String,
    pub server_uuid: String,
    pub country: String,
    pub status: bool,
    pub info_page_available: bool,
    pub created_at: DateTime<Utc>,
}

/// One historical probe result for a bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    pub uuid: String,
    pub bot_uuid: String,
    pub is_online: bool,
    pub created_at: DateTime<Utc>,
}
