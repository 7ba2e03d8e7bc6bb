// ── Wire-to-domain row conversions ──
//
// Bridges raw backend rows into `relaydir_core::model` domain types.
// Each conversion renames wire fields, parses date strings into
// `DateTime<Utc>`, and maps integer codes to symbolic variants.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{Bot, BotCommand, BotDetails, BotStatus, Protocol, Server, ServerStatus};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an ISO-8601 datetime string, dropping unparseable values.
fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn decode<T: for<'de> Deserialize<'de>>(row: Value) -> Result<T, CoreError> {
    serde_json::from_value(row).map_err(|e| CoreError::Deserialization {
        message: e.to_string(),
    })
}

// ── Servers ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ServerRow {
    uuid: String,
    host: String,
    identity: String,
    protocol: i64,
    info_page_available: Option<bool>,
    status: Option<bool>,
    #[serde(default)]
    uptime7: f64,
    #[serde(default)]
    uptime30: f64,
    #[serde(default)]
    uptime90: f64,
    last_check: Option<String>,
    country: Option<String>,
}

impl From<ServerRow> for Server {
    fn from(row: ServerRow) -> Self {
        Self {
            uuid: row.uuid,
            host: row.host,
            identity: row.identity,
            protocol: Protocol::from_wire_code(row.protocol),
            info_page_available: row.info_page_available.unwrap_or(false),
            status: row.status,
            uptime7: row.uptime7,
            uptime30: row.uptime30,
            uptime90: row.uptime90,
            last_check: parse_datetime(row.last_check.as_deref()),
            country: row.country.unwrap_or_default(),
        }
    }
}

pub(crate) fn server_from_row(row: Value) -> Result<Server, CoreError> {
    decode::<ServerRow>(row).map(Server::from)
}

// ── Server statuses ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ServerStatusRow {
    uuid: String,
    server_uuid: String,
    country: Option<String>,
    status: Option<bool>,
    info_page_available: Option<bool>,
    created_at: String,
}

impl From<ServerStatusRow> for ServerStatus {
    fn from(row: ServerStatusRow) -> Self {
        Self {
            uuid: row.uuid,
            server_uuid: row.server_uuid,
            country: row.country.unwrap_or_default(),
            status: row.status.unwrap_or(false),
            info_page_available: row.info_page_available.unwrap_or(false),
            created_at: parse_datetime(Some(row.created_at.as_str())).unwrap_or_default(),
        }
    }
}

pub(crate) fn server_status_from_row(row: Value) -> Result<ServerStatus, CoreError> {
    decode::<ServerStatusRow>(row).map(ServerStatus::from)
}

// ── Bots ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct BotRow {
    uuid: String,
    address: String,
    name: String,
    description: Option<String>,
    photo: Option<String>,
    is_online: Option<bool>,
    #[serde(default)]
    uptime7: f64,
    #[serde(default)]
    uptime30: f64,
    #[serde(default)]
    uptime90: f64,
    last_check: Option<String>,
    created_at: String,
}

impl From<BotRow> for Bot {
    fn from(row: BotRow) -> Self {
        Self {
            uuid: row.uuid,
            address: row.address,
            name: row.name,
            description: row.description,
            photo: row.photo,
            is_online: row.is_online,
            uptime7: row.uptime7,
            uptime30: row.uptime30,
            uptime90: row.uptime90,
            last_check: parse_datetime(row.last_check.as_deref()),
            created_at: parse_datetime(Some(row.created_at.as_str())).unwrap_or_default(),
        }
    }
}

pub(crate) fn bot_from_row(row: Value) -> Result<Bot, CoreError> {
    decode::<BotRow>(row).map(Bot::from)
}

// ── Bot statuses ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct BotStatusRow {
    uuid: String,
    bot_uuid: String,
    is_online: Option<bool>,
    created_at: String,
}

impl From<BotStatusRow> for BotStatus {
    fn from(row: BotStatusRow) -> Self {
        Self {
            uuid: row.uuid,
            bot_uuid: row.bot_uuid,
            is_online: row.is_online.unwrap_or(false),
            created_at: parse_datetime(Some(row.created_at.as_str())).unwrap_or_default(),
        }
    }
}

pub(crate) fn bot_status_from_row(row: Value) -> Result<BotStatus, CoreError> {
    decode::<BotStatusRow>(row).map(BotStatus::from)
}

// ── Bot details (embedded-resource row) ────────────────────────────

#[derive(Deserialize)]
struct BotDetailsRow {
    uuid: String,
    bot_reply_messages: Option<ReplyMessageRow>,
    bot_profiles: Option<BotProfileRow>,
}

#[derive(Deserialize)]
struct ReplyMessageRow {
    text: Option<String>,
}

#[derive(Deserialize)]
struct BotProfileRow {
    #[serde(default)]
    bot_commands: Vec<BotCommandRow>,
}

#[derive(Deserialize)]
struct BotCommandRow {
    keyword: String,
    label: String,
}

impl From<BotDetailsRow> for BotDetails {
    fn from(row: BotDetailsRow) -> Self {
        Self {
            bot_uuid: row.uuid,
            reply_message: row.bot_reply_messages.and_then(|m| m.text),
            commands: row
                .bot_profiles
                .map(|p| {
                    p.bot_commands
                        .into_iter()
                        .map(|c| BotCommand {
                            keyword: c.keyword,
                            label: c.label,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

pub(crate) fn bot_details_from_row(row: Value) -> Result<BotDetails, CoreError> {
    decode::<BotDetailsRow>(row).map(BotDetails::from)
}
