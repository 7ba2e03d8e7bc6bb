// ── Bot details fetch service ──

use std::sync::Arc;

use tracing::debug;

use relaydir_api::QueryClient;

use crate::convert::bot_details_from_row;
use crate::error::CoreError;
use crate::store::BotDetailsStore;

/// Embedded-resource projection joining the reply message and the
/// profile's command list onto a single bot row.
const DETAILS_SELECT: &str = "uuid, \
    bot_reply_messages!bot_reply_messages_bot_uuid_fkey (*), \
    bot_profiles!bot_profiles_bot_uuid_fkey (*, bot_commands (*))";

/// Lazily fetches the detail record for a single bot into a
/// [`BotDetailsStore`].
pub struct BotDetailsService {
    client: Arc<QueryClient>,
    store: Arc<BotDetailsStore>,
    table: String,
}

impl BotDetailsService {
    pub fn new(
        client: Arc<QueryClient>,
        store: Arc<BotDetailsStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch the detail record for one bot and merge it into the store.
    /// A bot unknown to the backend yields [`CoreError::NotFound`].
    pub async fn fetch(&self, bot_uuid: &str) -> Result<(), CoreError> {
        let page = self
            .client
            .from(&self.table)?
            .select(DETAILS_SELECT)
            .eq("uuid", bot_uuid)
            .execute()
            .await?;

        let row = page
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NotFound {
                what: format!("bot {bot_uuid}"),
            })?;
        let details = bot_details_from_row(row)?;

        debug!(bot_uuid, "merging fetched bot details");
        self.store.upsert(details);
        Ok(())
    }
}
