//! Authoritative store for user-owned calendar events.

use std::path::{Path, PathBuf};

use crate::error::TimetableResult;
use crate::event::LocalEvent;

const LOCAL_EVENTS_FILE: &str = "local_events_v1.json";

/// The full owned event set, persisted load-all/save-all. The backend
/// mirror is a downstream copy and never written from here.
pub struct LocalEventStore {
    path: PathBuf,
    events: Vec<LocalEvent>,
}

impl LocalEventStore {
    /// Open the store in `dir`, loading any persisted events. A missing
    /// file yields an empty store; an unreadable one is logged and
    /// treated the same.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(LOCAL_EVENTS_FILE);
        let events = match Self::load(&path) {
            Ok(events) => events,
            Err(err) => {
                log::warn!("Failed to load local events: {err}");
                Vec::new()
            }
        };

        LocalEventStore { path, events }
    }

    fn load(path: &Path) -> TimetableResult<Vec<LocalEvent>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Current full owned set. Order is not significant.
    pub fn list(&self) -> &[LocalEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&LocalEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Insert or replace by id, then re-persist the full list.
    pub fn upsert(&mut self, event: LocalEvent) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
        self.persist();
    }

    /// Remove by id. Returns whether an event was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);

        let removed = self.events.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Wholesale replacement, used when adopting backend rows at session
    /// start.
    pub fn replace_all(&mut self, events: Vec<LocalEvent>) {
        self.events = events;
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.write_to_disk() {
            log::warn!("Failed to save local events: {err}");
        }
    }

    fn write_to_disk(&self) -> TimetableResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(&self.events)?;

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
