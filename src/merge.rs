//! The unified view and provenance-based edit routing.
//!
//! The unified list is never materialized: local events and feed events
//! (decorated with their annotations) are re-joined on every build. Edits
//! flow back through [`apply_edit`]/[`apply_delete`], which route to the
//! local event store or the override store depending on where the entry
//! came from.

use crate::constants::DEFAULT_EVENT_COLOR;
use crate::event::{
    CalendarEntry, EntryKind, EntryOrigin, EventTime, IcalSubscription, LocalEvent, RemoteEvent,
};
use crate::identity::{derive_meta_key, make_title_abbr};
use crate::store::{LocalEventStore, OverridePatch, OverrideStore};

/// One subscription together with its most recent parsed snapshot.
#[derive(Debug, Clone)]
pub struct Feed {
    pub subscription: IcalSubscription,
    pub events: Vec<RemoteEvent>,
}

/// Partial update for a unified entry. Callers supply only the fields
/// that changed; which of them actually apply depends on the entry's
/// origin.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub full_title: Option<String>,
    pub title_abbr: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub is_title_abbr_custom: Option<bool>,
    pub kind: Option<EntryKind>,
    pub hidden: Option<bool>,
}

/// Build the single list the UI renders: every feed event decorated with
/// its annotations, followed by every local event.
///
/// No de-duplication across subscriptions: if two feeds supply the "same"
/// logical event, both appear.
pub fn build_unified_list(
    local_events: &[LocalEvent],
    feeds: &[Feed],
    overrides: &OverrideStore,
) -> Vec<CalendarEntry> {
    let remote_count: usize = feeds.iter().map(|f| f.events.len()).sum();
    let mut entries = Vec::with_capacity(remote_count + local_events.len());

    for feed in feeds {
        for event in &feed.events {
            entries.push(remote_entry(&feed.subscription, event, overrides));
        }
    }
    entries.extend(local_events.iter().map(CalendarEntry::from_local_event));

    entries
}

/// Join one feed event with its annotation record, deriving defaults for
/// everything not overridden.
fn remote_entry(
    subscription: &IcalSubscription,
    event: &RemoteEvent,
    overrides: &OverrideStore,
) -> CalendarEntry {
    let meta_key = derive_meta_key(&subscription.id, event.effective_uid());
    let meta = overrides.get(&meta_key);

    let full_title = if event.summary.is_empty() {
        subscription.name.clone()
    } else {
        event.summary.clone()
    };

    let title_abbr = meta
        .and_then(|m| m.title_abbr.clone())
        .unwrap_or_else(|| make_title_abbr(&full_title));

    let color = meta
        .and_then(|m| m.color.clone())
        .unwrap_or_else(|| {
            if subscription.color.is_empty() {
                DEFAULT_EVENT_COLOR.to_string()
            } else {
                subscription.color.clone()
            }
        });

    CalendarEntry {
        id: meta_key.clone(),
        title: title_abbr.clone(),
        full_title,
        title_abbr,
        is_title_abbr_custom: meta.is_some_and(|m| m.is_title_abbr_custom),
        start: event.start.clone(),
        end: event.end.clone(),
        color,
        note: meta.and_then(|m| m.note.clone()).unwrap_or_default(),
        kind: meta
            .and_then(|m| m.kind)
            .or(subscription.default_kind)
            .unwrap_or_default(),
        hidden: meta.is_some_and(|m| m.hidden),
        origin: EntryOrigin::Ical {
            subscription_id: subscription.id.clone(),
            event_uid: event.effective_uid().to_string(),
            meta_key,
        },
    }
}

/// Route an edit to the store that owns the entry.
///
/// Local entries are upserted in full. Feed entries only accept the
/// overridable fields; `full_title`/`start`/`end` are dropped without
/// error (the editor never offers those controls for feed entries) and no
/// local event is ever created for them.
pub fn apply_edit(
    locals: &mut LocalEventStore,
    overrides: &mut OverrideStore,
    entry: &CalendarEntry,
    patch: EntryPatch,
) {
    match &entry.origin {
        EntryOrigin::Local => {
            let mut event = match locals.get(&entry.id) {
                Some(existing) => existing.clone(),
                None => local_event_from_entry(entry),
            };

            if let Some(full_title) = patch.full_title {
                event.full_title = full_title;
            }
            if let Some(title_abbr) = patch.title_abbr {
                event.title_abbr = title_abbr;
            }
            if let Some(start) = patch.start {
                event.start = start;
            }
            if let Some(end) = patch.end {
                event.end = end;
            }
            if let Some(note) = patch.note {
                event.note = note;
            }
            if let Some(color) = patch.color {
                event.color = color;
            }
            if let Some(custom) = patch.is_title_abbr_custom {
                event.is_title_abbr_custom = custom;
            }
            if let Some(kind) = patch.kind {
                event.kind = kind;
            }
            if let Some(hidden) = patch.hidden {
                event.hidden = hidden;
            }

            locals.upsert(event);
        }
        EntryOrigin::Ical { meta_key, .. } => {
            overrides.set(
                meta_key,
                OverridePatch {
                    title_abbr: patch.title_abbr,
                    note: patch.note,
                    color: patch.color,
                    is_title_abbr_custom: patch.is_title_abbr_custom,
                    kind: patch.kind,
                    hidden: patch.hidden,
                },
            );
        }
    }
}

/// Route a delete. Local entries are removed from the store; feed entries
/// cannot be deleted, so this neither touches the override store nor the
/// feed. Returns whether a local event was removed.
pub fn apply_delete(locals: &mut LocalEventStore, entry: &CalendarEntry) -> bool {
    match entry.origin {
        EntryOrigin::Local => locals.remove(&entry.id),
        EntryOrigin::Ical { .. } => false,
    }
}

fn local_event_from_entry(entry: &CalendarEntry) -> LocalEvent {
    LocalEvent {
        id: entry.id.clone(),
        full_title: entry.full_title.clone(),
        title_abbr: entry.title_abbr.clone(),
        is_title_abbr_custom: entry.is_title_abbr_custom,
        start: entry.start.clone(),
        end: entry.end.clone(),
        color: entry.color.clone(),
        note: entry.note.clone(),
        kind: entry.kind,
        hidden: entry.hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn subscription(id: &str, color: &str) -> IcalSubscription {
        IcalSubscription {
            id: id.to_string(),
            name: "Uni Schedule".to_string(),
            url: "https://example.com/feed.ics".to_string(),
            color: color.to_string(),
            default_kind: None,
        }
    }

    fn remote(uid: &str, summary: &str) -> RemoteEvent {
        RemoteEvent {
            uid: Some(uid.to_string()),
            fallback_id: format!("fallback-{uid}"),
            summary: summary.to_string(),
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 20, 8, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
        }
    }

    fn local(id: &str, title: &str) -> LocalEvent {
        LocalEvent {
            id: id.to_string(),
            full_title: title.to_string(),
            title_abbr: make_title_abbr(title),
            is_title_abbr_custom: false,
            start: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 21, 10, 0, 0).unwrap()),
            end: EventTime::DateTime(Utc.with_ymd_and_hms(2025, 3, 21, 11, 0, 0).unwrap()),
            color: "#69db7c".to_string(),
            note: String::new(),
            kind: EntryKind::None,
            hidden: false,
        }
    }

    fn stores() -> (tempfile::TempDir, LocalEventStore, OverrideStore) {
        let dir = tempfile::tempdir().unwrap();
        let locals = LocalEventStore::open(dir.path());
        let overrides = OverrideStore::open(dir.path());
        (dir, locals, overrides)
    }

    #[test]
    fn test_feed_entries_get_derived_defaults() {
        let (_dir, _locals, overrides) = stores();
        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "Software Engineering")],
        }];

        let entries = build_unified_list(&[], &feeds, &overrides);
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.id, "sub-1::uid-a");
        assert_eq!(entry.title_abbr, "SE");
        assert_eq!(entry.color, "#2196f3");
        assert_eq!(entry.note, "");
        assert!(!entry.is_title_abbr_custom);
        assert!(entry.is_ical());
    }

    #[test]
    fn test_override_takes_precedence_over_derived_defaults() {
        let (_dir, _locals, mut overrides) = stores();
        overrides.set(
            "sub-1::uid-a",
            OverridePatch {
                title_abbr: Some("SWE".to_string()),
                note: Some("bring laptop".to_string()),
                color: Some("#ffd43b".to_string()),
                is_title_abbr_custom: Some(true),
                ..Default::default()
            },
        );

        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "Software Engineering")],
        }];
        let entries = build_unified_list(&[], &feeds, &overrides);

        let entry = &entries[0];
        assert_eq!(entry.title_abbr, "SWE");
        assert_eq!(entry.note, "bring laptop");
        assert_eq!(entry.color, "#ffd43b");
        assert!(entry.is_title_abbr_custom);
    }

    #[test]
    fn test_build_is_idempotent() {
        let (_dir, _locals, mut overrides) = stores();
        overrides.set(
            "sub-1::uid-a",
            OverridePatch {
                note: Some("bring laptop".to_string()),
                ..Default::default()
            },
        );

        let locals = vec![local("ev-1", "Study Group")];
        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "Software Engineering")],
        }];

        let first = build_unified_list(&locals, &feeds, &overrides);
        let second = build_unified_list(&locals, &feeds, &overrides);
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_uid_in_two_subscriptions_appears_twice() {
        let (_dir, _locals, overrides) = stores();
        let feeds = vec![
            Feed {
                subscription: subscription("sub-1", "#2196f3"),
                events: vec![remote("uid-a", "Software Engineering")],
            },
            Feed {
                subscription: subscription("sub-2", "#845ef7"),
                events: vec![remote("uid-a", "Software Engineering")],
            },
        ];

        let entries = build_unified_list(&[], &feeds, &overrides);
        assert_eq!(entries.len(), 2);
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_missing_uid_uses_session_fallback() {
        let (_dir, _locals, overrides) = stores();
        let mut event = remote("unused", "Lecture");
        event.uid = None;
        event.fallback_id = "gen-17".to_string();

        let feeds = vec![Feed {
            subscription: subscription("sub-1", ""),
            events: vec![event],
        }];
        let entries = build_unified_list(&[], &feeds, &overrides);

        assert_eq!(entries[0].id, "sub-1::gen-17");
        // No subscription color either: falls back to the engine default.
        assert_eq!(entries[0].color, DEFAULT_EVENT_COLOR);
    }

    #[test]
    fn test_empty_summary_falls_back_to_subscription_name() {
        let (_dir, _locals, overrides) = stores();
        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "")],
        }];

        let entries = build_unified_list(&[], &feeds, &overrides);
        assert_eq!(entries[0].full_title, "Uni Schedule");
        assert_eq!(entries[0].title_abbr, "US");
    }

    #[test]
    fn test_subscription_default_kind_applies_unless_overridden() {
        let (_dir, _locals, mut overrides) = stores();
        let mut sub = subscription("sub-1", "#2196f3");
        sub.default_kind = Some(EntryKind::Course);

        let feeds = vec![Feed {
            subscription: sub,
            events: vec![remote("uid-a", "Lecture"), remote("uid-b", "Party")],
        }];

        overrides.set(
            "sub-1::uid-b",
            OverridePatch {
                kind: Some(EntryKind::Event),
                ..Default::default()
            },
        );

        let entries = build_unified_list(&[], &feeds, &overrides);
        assert_eq!(entries[0].kind, EntryKind::Course);
        assert_eq!(entries[1].kind, EntryKind::Event);
    }

    #[test]
    fn test_edit_on_feed_entry_drops_immutable_fields() {
        let (_dir, mut locals, mut overrides) = stores();
        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "Software Engineering")],
        }];
        let entry = build_unified_list(&[], &feeds, &overrides)[0].clone();

        apply_edit(
            &mut locals,
            &mut overrides,
            &entry,
            EntryPatch {
                full_title: Some("Hacked".to_string()),
                start: Some(EventTime::DateTime(
                    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                )),
                note: Some("bring laptop".to_string()),
                ..Default::default()
            },
        );

        // No local event materialized, and only the overridable field landed.
        assert!(locals.list().is_empty());
        let record = overrides.get("sub-1::uid-a").expect("Should exist");
        assert_eq!(record.note.as_deref(), Some("bring laptop"));
        assert_eq!(record.title_abbr, None);

        let rebuilt = build_unified_list(&[], &feeds, &overrides);
        assert_eq!(rebuilt[0].full_title, "Software Engineering");
        assert_eq!(rebuilt[0].start, entry.start);
    }

    #[test]
    fn test_edit_on_local_entry_upserts() {
        let (_dir, mut locals, mut overrides) = stores();
        locals.upsert(local("ev-1", "Study Group"));
        let entry = CalendarEntry::from_local_event(locals.get("ev-1").unwrap());

        apply_edit(
            &mut locals,
            &mut overrides,
            &entry,
            EntryPatch {
                full_title: Some("Study Group (moved)".to_string()),
                note: Some("new room".to_string()),
                ..Default::default()
            },
        );

        let updated = locals.get("ev-1").expect("Should exist");
        assert_eq!(updated.full_title, "Study Group (moved)");
        assert_eq!(updated.note, "new room");
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_delete_routes_by_origin() {
        let (_dir, mut locals, mut overrides) = stores();
        locals.upsert(local("ev-1", "Study Group"));
        let local_entry = CalendarEntry::from_local_event(locals.get("ev-1").unwrap());

        overrides.set(
            "sub-1::uid-a",
            OverridePatch {
                note: Some("keep me".to_string()),
                ..Default::default()
            },
        );
        let feeds = vec![Feed {
            subscription: subscription("sub-1", "#2196f3"),
            events: vec![remote("uid-a", "Software Engineering")],
        }];
        let feed_entry = build_unified_list(&[], &feeds, &overrides)[0].clone();

        assert!(apply_delete(&mut locals, &local_entry));
        assert!(locals.list().is_empty());

        // Deleting a feed entry is a data-layer no-op: the annotation stays.
        assert!(!apply_delete(&mut locals, &feed_entry));
        assert_eq!(
            overrides.get("sub-1::uid-a").unwrap().note.as_deref(),
            Some("keep me")
        );
    }
}
