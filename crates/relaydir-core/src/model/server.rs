// ── Server domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Relay protocol spoken by a directory entry. Wire rows carry this as an
/// integer code (1 = smp, 2 = xftp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Smp,
    Xftp,
}

impl Protocol {
    /// The integer code used in wire rows and eq-filters.
    pub fn wire_code(self) -> i64 {
        match self {
            Self::Smp => 1,
            Self::Xftp => 2,
        }
    }

    pub fn from_wire_code(code: i64) -> Self {
        if code == 1 { Self::Smp } else { Self::Xftp }
    }
}

/// A directory entry for one relay server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub uuid: String,
    pub host: String,
    /// Server identity key fingerprint (the part before `@` in the URI).
    pub identity: String,
    pub protocol: Protocol,
    pub info_page_available: bool,
    /// `None` when the server has never been probed.
    pub status: Option<bool>,
    pub uptime7: f64,
    pub uptime30: f64,
    pub uptime90: f64,
    pub last_check: Option<DateTime<Utc>>,
    pub country: String,
}

impl Server {
    /// The canonical server URI: `{protocol}://{identity}@{host}`.
    pub fn uri(&self) -> String {
        format!("{}://{}@{}", self.protocol, self.identity, self.host)
    }
}
