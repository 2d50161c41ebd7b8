//! Best-effort mirroring of local events to the backend.
//!
//! The local store is authoritative; the mirror is a write-behind cache
//! for cross-device visibility. Every push replaces the full owned set,
//! so overlapping pushes are idempotent and a later successful push
//! repairs an earlier failed one.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::TimetableResult;
use crate::event::LocalEvent;
use crate::mapping::EntryRow;

/// The backend mirror seam. Implementations write one flat row per local
/// event, partitioned by user id, replacing whatever was there before.
#[async_trait]
pub trait CalendarMirror: Send + Sync {
    async fn replace_events(&self, owner_id: &str, rows: Vec<EntryRow>) -> TimetableResult<()>;
}

/// Fire-and-forget push of the entire current local set.
///
/// Never blocks the caller and never surfaces failure: a failed push is
/// logged and dropped. The handle is returned so hosts and tests can
/// observe completion, but nothing in the engine awaits it.
pub fn spawn_push(
    mirror: Arc<dyn CalendarMirror>,
    owner_id: String,
    events: Vec<LocalEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let rows: Vec<EntryRow> = events
            .iter()
            .map(|event| EntryRow::from_local_event(event, &owner_id))
            .collect();

        log::debug!("Pushing {} local events to the calendar mirror", rows.len());
        if let Err(err) = mirror.replace_events(&owner_id, rows).await {
            log::warn!("Calendar mirror push failed: {err}");
        }
    })
}
