//! Per-feed-event annotation store.
//!
//! Feed events are read-only; everything a user may change about one
//! (abbreviation, note, color, display kind, hiding) lives here, keyed by
//! the derived meta key. Records are created lazily on first edit and are
//! never deleted by normal use, so annotations survive feed refreshes as
//! long as the `(subscription, uid)` pair recurs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::OVERRIDE_SOFT_CAP;
use crate::error::TimetableResult;
use crate::event::EntryKind;

const OVERRIDES_FILE: &str = "ical_event_meta_v1.json";

/// User annotations for one feed event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_abbr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_title_abbr_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    #[serde(default)]
    pub hidden: bool,
}

/// Partial update for an [`OverrideRecord`]. Callers supply only the
/// fields that changed.
#[derive(Debug, Clone, Default)]
pub struct OverridePatch {
    pub title_abbr: Option<String>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub is_title_abbr_custom: Option<bool>,
    pub kind: Option<EntryKind>,
    pub hidden: Option<bool>,
}

/// Map of meta key to annotation record, persisted load-all/save-all.
/// Local-only: no network calls, no cross-device sync.
pub struct OverrideStore {
    path: PathBuf,
    map: HashMap<String, OverrideRecord>,
}

impl OverrideStore {
    /// Open the store in `dir`. A missing or unreadable file yields an
    /// empty map (unreadable is logged).
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(OVERRIDES_FILE);
        let map = match Self::load(&path) {
            Ok(map) => map,
            Err(err) => {
                log::warn!("Failed to load feed event annotations: {err}");
                HashMap::new()
            }
        };

        OverrideStore { path, map }
    }

    fn load(path: &Path) -> TimetableResult<HashMap<String, OverrideRecord>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, meta_key: &str) -> Option<&OverrideRecord> {
        self.map.get(meta_key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Merge `patch` into the record for `meta_key`, creating a default
    /// record if absent, then re-persist the full map.
    ///
    /// New keys past the soft cap are dropped with a warning; existing
    /// records always stay editable.
    pub fn set(&mut self, meta_key: &str, patch: OverridePatch) {
        if !self.map.contains_key(meta_key) && self.map.len() >= OVERRIDE_SOFT_CAP {
            log::warn!(
                "Feed annotation map at capacity ({OVERRIDE_SOFT_CAP}), \
                 dropping annotation for {meta_key}"
            );
            return;
        }

        let record = self.map.entry(meta_key.to_string()).or_default();
        if let Some(title_abbr) = patch.title_abbr {
            record.title_abbr = Some(title_abbr);
        }
        if let Some(note) = patch.note {
            record.note = Some(note);
        }
        if let Some(color) = patch.color {
            record.color = Some(color);
        }
        if let Some(custom) = patch.is_title_abbr_custom {
            record.is_title_abbr_custom = custom;
        }
        if let Some(kind) = patch.kind {
            record.kind = Some(kind);
        }
        if let Some(hidden) = patch.hidden {
            record.hidden = hidden;
        }

        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.write_to_disk() {
            log::warn!("Failed to save feed event annotations: {err}");
        }
    }

    fn write_to_disk(&self) -> TimetableResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(&self.map)?;

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_creates_record_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OverrideStore::open(dir.path());

        store.set(
            "sub-1::uid-a",
            OverridePatch {
                note: Some("bring laptop".to_string()),
                ..Default::default()
            },
        );

        let record = store.get("sub-1::uid-a").expect("Should exist");
        assert_eq!(record.note.as_deref(), Some("bring laptop"));
        assert_eq!(record.title_abbr, None);
        assert!(!record.is_title_abbr_custom);
        assert!(!record.hidden);
    }

    #[test]
    fn test_set_merges_without_clearing_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OverrideStore::open(dir.path());

        store.set(
            "sub-1::uid-a",
            OverridePatch {
                title_abbr: Some("SE".to_string()),
                is_title_abbr_custom: Some(true),
                ..Default::default()
            },
        );
        store.set(
            "sub-1::uid-a",
            OverridePatch {
                color: Some("#ffd43b".to_string()),
                ..Default::default()
            },
        );

        let record = store.get("sub-1::uid-a").expect("Should exist");
        assert_eq!(record.title_abbr.as_deref(), Some("SE"));
        assert!(record.is_title_abbr_custom);
        assert_eq!(record.color.as_deref(), Some("#ffd43b"));
    }

    #[test]
    fn test_annotations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = OverrideStore::open(dir.path());
        store.set(
            "sub-1::uid-a",
            OverridePatch {
                note: Some("bring laptop".to_string()),
                ..Default::default()
            },
        );
        drop(store);

        let reopened = OverrideStore::open(dir.path());
        assert_eq!(
            reopened.get("sub-1::uid-a").unwrap().note.as_deref(),
            Some("bring laptop")
        );
    }

    #[test]
    fn test_soft_cap_rejects_new_keys_but_not_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = OverrideStore::open(dir.path());

        for n in 0..OVERRIDE_SOFT_CAP {
            store.map.insert(format!("sub-1::uid-{n}"), OverrideRecord::default());
        }

        store.set(
            "sub-1::uid-new",
            OverridePatch {
                note: Some("dropped".to_string()),
                ..Default::default()
            },
        );
        assert!(store.get("sub-1::uid-new").is_none());

        store.set(
            "sub-1::uid-0",
            OverridePatch {
                note: Some("still editable".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            store.get("sub-1::uid-0").unwrap().note.as_deref(),
            Some("still editable")
        );
    }
}
