// ── Bot status history fetch service ──

use std::sync::Arc;

use tracing::debug;

use relaydir_api::QueryClient;

use crate::convert::bot_status_from_row;
use crate::error::CoreError;
use crate::model::BotStatus;
use crate::store::BotStatusesStore;

/// Fetches probe history rows for a set of bots into a
/// [`BotStatusesStore`].
pub struct BotStatusesService {
    client: Arc<QueryClient>,
    store: Arc<BotStatusesStore>,
    table: String,
}

impl BotStatusesService {
    pub fn new(
        client: Arc<QueryClient>,
        store: Arc<BotStatusesStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch all statuses for the given bots, oldest first, and merge
    /// them into the store.
    pub async fn fetch<S: AsRef<str>>(&self, bot_uuids: &[S]) -> Result<(), CoreError> {
        let page = self
            .client
            .from(&self.table)?
            .in_list("bot_uuid", bot_uuids)
            .order("created_at", true)
            .execute()
            .await?;

        let statuses = page
            .rows
            .into_iter()
            .map(bot_status_from_row)
            .collect::<Result<Vec<BotStatus>, _>>()?;

        debug!(count = statuses.len(), "merging fetched bot statuses");
        self.store.upsert(statuses);
        Ok(())
    }
}
