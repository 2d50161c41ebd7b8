//! The engine root: stores, feed snapshots, the editor, and the mirror.
//!
//! Owns the full local-first pipeline: feed snapshots plus the two stores
//! are joined into a cached unified projection, the editor buffers one
//! draft at a time, and every local mutation kicks off an advisory
//! full-state push to the backend mirror.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::UnitableConfig;
use crate::constants::{DEFAULT_EVENT_COLOR, UNTITLED_EVENT_TITLE};
use crate::editor::{
    CancelOutcome, CloseAttempt, CloseOutcome, DraftPatch, Editor, EditorDraft,
};
use crate::error::TimetableResult;
use crate::event::{
    CalendarEntry, EntryKind, EntryOrigin, EventTime, IcalSubscription, LocalEvent, RemoteEvent,
};
use crate::identity::{clamp_abbr, make_title_abbr};
use crate::mapping::EntryRow;
use crate::merge::{self, EntryPatch, Feed};
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::store::{LocalEventStore, OverrideRecord, OverrideStore};
use crate::sync::{self, CalendarMirror};

pub struct Timetable {
    owner_id: String,
    locals: LocalEventStore,
    overrides: OverrideStore,
    feeds: Vec<Feed>,
    editor: Editor,
    /// A drag-created event that has not been saved yet. Shown in the
    /// unified list, but only promoted into the store on save.
    pending_create: Option<LocalEvent>,
    /// Derived projection over all sources, rebuilt lazily after any of
    /// them changes.
    cached_entries: Option<Vec<CalendarEntry>>,
    mirror: Option<Arc<dyn CalendarMirror>>,
    notifier: ChangeNotifier,
}

impl Timetable {
    /// Open the engine for `owner_id` using the global configuration.
    pub fn open(owner_id: &str) -> TimetableResult<Self> {
        let config = UnitableConfig::load()?;
        Ok(Self::open_at(&config.data_path(), owner_id))
    }

    /// Open the engine with an explicit data directory.
    pub fn open_at(data_dir: &Path, owner_id: &str) -> Self {
        Timetable {
            owner_id: owner_id.to_string(),
            locals: LocalEventStore::open(data_dir),
            overrides: OverrideStore::open(data_dir),
            feeds: Vec::new(),
            editor: Editor::default(),
            pending_create: None,
            cached_entries: None,
            mirror: None,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Attach the backend mirror that receives full-state pushes.
    pub fn with_mirror(mut self, mirror: Arc<dyn CalendarMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeKind> {
        self.notifier.subscribe()
    }

    // FEEDS:

    /// Replace the parsed snapshot for one subscription (adding the feed
    /// if it is new).
    pub fn update_feed(&mut self, subscription: IcalSubscription, events: Vec<RemoteEvent>) {
        match self
            .feeds
            .iter_mut()
            .find(|f| f.subscription.id == subscription.id)
        {
            Some(feed) => {
                feed.subscription = subscription;
                feed.events = events;
            }
            None => self.feeds.push(Feed {
                subscription,
                events,
            }),
        }

        self.invalidate();
        self.notifier.notify(ChangeKind::Feeds);
    }

    pub fn remove_feed(&mut self, subscription_id: &str) -> bool {
        let before = self.feeds.len();
        self.feeds.retain(|f| f.subscription.id != subscription_id);

        let removed = self.feeds.len() != before;
        if removed {
            self.invalidate();
            self.notifier.notify(ChangeKind::Feeds);
        }
        removed
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    // UNIFIED VIEW:

    /// The single list the UI renders, rebuilt on demand after a source
    /// changed.
    pub fn entries(&mut self) -> &[CalendarEntry] {
        if self.cached_entries.is_none() {
            let mut list =
                merge::build_unified_list(self.locals.list(), &self.feeds, &self.overrides);
            if let Some(pending) = &self.pending_create {
                list.push(CalendarEntry::from_local_event(pending));
            }
            self.cached_entries = Some(list);
        }

        self.cached_entries.as_deref().unwrap_or_default()
    }

    pub fn local_events(&self) -> &[LocalEvent] {
        self.locals.list()
    }

    pub fn override_for(&self, meta_key: &str) -> Option<&OverrideRecord> {
        self.overrides.get(meta_key)
    }

    fn invalidate(&mut self) {
        self.cached_entries = None;
    }

    /// Adopt the backend's rows for this user at session start, keeping
    /// fields the backend does not persist (`hidden`) from the cached
    /// local copy. During a session the local store stays authoritative.
    pub fn hydrate_local_events(&mut self, rows: Vec<EntryRow>) {
        let mut adopted = Vec::new();
        for row in rows {
            if row.user_id != self.owner_id {
                continue;
            }

            let row_id = row.id.clone();
            let Some(event) = row.into_local_event() else {
                log::warn!("Skipping backend row with unparseable period: {row_id}");
                continue;
            };

            let event = match self.locals.get(&event.id) {
                Some(cached) => LocalEvent {
                    hidden: cached.hidden,
                    ..event
                },
                None => event,
            };
            adopted.push(event);
        }

        self.locals.replace_all(adopted);
        self.invalidate();
        self.notifier.notify(ChangeKind::LocalEvents);
    }

    /// Hide or un-hide an entry at presentation time, routed by origin.
    /// This never pushes to the mirror; hiding is a local-only concern.
    pub fn set_entry_hidden(&mut self, entry_id: &str, hidden: bool) -> bool {
        let entry = match self.entries().iter().find(|e| e.id == entry_id) {
            Some(entry) => entry.clone(),
            None => return false,
        };

        merge::apply_edit(
            &mut self.locals,
            &mut self.overrides,
            &entry,
            EntryPatch {
                hidden: Some(hidden),
                ..Default::default()
            },
        );

        self.invalidate();
        self.notifier.notify(match entry.origin {
            EntryOrigin::Local => ChangeKind::LocalEvents,
            EntryOrigin::Ical { .. } => ChangeKind::Overrides,
        });
        true
    }

    // EDITOR:

    /// Open an entry for editing. Returns false when the id is not in the
    /// unified list.
    pub fn open_editor(&mut self, entry_id: &str) -> bool {
        let entry = match self.entries().iter().find(|e| e.id == entry_id) {
            Some(entry) => entry.clone(),
            None => return false,
        };

        self.editor.open(&entry, false);
        true
    }

    /// Materialize a blank local event for the given period (drag-to-
    /// create) and open it in creating mode. Returns the new event id.
    pub fn begin_create(&mut self, start: EventTime, end: EventTime) -> String {
        let event = LocalEvent {
            id: Uuid::new_v4().to_string(),
            full_title: String::new(),
            title_abbr: String::new(),
            is_title_abbr_custom: false,
            start,
            end,
            color: DEFAULT_EVENT_COLOR.to_string(),
            note: String::new(),
            kind: EntryKind::None,
            hidden: false,
        };

        let entry = CalendarEntry::from_local_event(&event);
        let id = event.id.clone();

        self.pending_create = Some(event);
        self.invalidate();
        self.editor.open(&entry, true);
        id
    }

    pub fn is_editor_open(&self) -> bool {
        self.editor.is_open()
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.is_dirty()
    }

    pub fn is_ical_editing(&self) -> bool {
        self.editor.is_ical_editing()
    }

    pub fn is_creating_new(&self) -> bool {
        self.editor.is_creating_new()
    }

    pub fn confirming_discard(&self) -> Option<CloseAttempt> {
        self.editor.confirming_discard()
    }

    pub fn draft(&self) -> Option<&EditorDraft> {
        self.editor.draft()
    }

    /// The merged view of the entry being edited, as captured at open time.
    pub fn editing_entry(&self) -> Option<&CalendarEntry> {
        self.editor.entry()
    }

    pub fn update_form(&mut self, patch: DraftPatch) {
        self.editor.update_form(patch);
    }

    pub fn set_full_title(&mut self, text: &str) {
        self.update_form(DraftPatch {
            full_title: Some(text.to_string()),
            ..Default::default()
        });
    }

    pub fn set_title_abbr(&mut self, text: &str) {
        self.update_form(DraftPatch {
            title_abbr: Some(text.to_string()),
            ..Default::default()
        });
    }

    pub fn set_from(&mut self, from: EventTime) {
        self.update_form(DraftPatch {
            from: Some(from),
            ..Default::default()
        });
    }

    pub fn set_until(&mut self, until: EventTime) {
        self.update_form(DraftPatch {
            until: Some(until),
            ..Default::default()
        });
    }

    /// Ask to close the editor. A clean creating session also drops the
    /// pending drag-created event.
    pub fn request_close(&mut self, attempt: CloseAttempt) -> CloseOutcome {
        let creating = self.editor.is_creating_new();
        let outcome = self.editor.request_close(attempt);

        if outcome == CloseOutcome::Closed && creating {
            self.drop_pending_create();
        }
        outcome
    }

    pub fn cancel_close(&mut self) -> CancelOutcome {
        self.editor.cancel_close()
    }

    /// Drop the draft unconditionally. No store mutation.
    pub fn discard(&mut self) {
        if let Some(session) = self.editor.take_session() {
            if session.creating {
                self.drop_pending_create();
            }
        }
    }

    /// Commit the draft, routed by the edited entry's origin, then (for
    /// local entries) trigger the advisory mirror push.
    pub fn save(&mut self) -> Option<JoinHandle<()>> {
        let session = self.editor.take_session()?;
        let draft = session.draft;
        let entry = session.entry;

        if entry.is_ical() {
            // The feed title is frozen; it only seeds the abbreviation
            // fallback.
            let full_title = if entry.full_title.is_empty() {
                UNTITLED_EVENT_TITLE.to_string()
            } else {
                entry.full_title.clone()
            };
            let title_abbr = clamp_abbr(&if draft.title_abbr.is_empty() {
                make_title_abbr(&full_title)
            } else {
                draft.title_abbr
            });

            merge::apply_edit(
                &mut self.locals,
                &mut self.overrides,
                &entry,
                EntryPatch {
                    title_abbr: Some(title_abbr),
                    note: Some(draft.note),
                    color: (!draft.color.is_empty()).then_some(draft.color),
                    is_title_abbr_custom: Some(session.has_custom_abbr),
                    kind: Some(draft.kind),
                    ..Default::default()
                },
            );

            self.invalidate();
            self.notifier.notify(ChangeKind::Overrides);
            return None;
        }

        let full_title = if draft.full_title.trim().is_empty() {
            UNTITLED_EVENT_TITLE.to_string()
        } else {
            draft.full_title
        };
        let title_abbr = clamp_abbr(&if draft.title_abbr.is_empty() {
            make_title_abbr(&full_title)
        } else {
            draft.title_abbr
        });

        merge::apply_edit(
            &mut self.locals,
            &mut self.overrides,
            &entry,
            EntryPatch {
                full_title: Some(full_title),
                title_abbr: Some(title_abbr),
                start: Some(draft.from),
                end: Some(draft.until),
                note: Some(draft.note),
                color: (!draft.color.is_empty()).then_some(draft.color),
                is_title_abbr_custom: Some(session.has_custom_abbr),
                kind: Some(draft.kind),
                ..Default::default()
            },
        );

        if session.creating {
            // Promoted into the store; no longer pending.
            self.pending_create = None;
        }
        self.invalidate();
        self.notifier.notify(ChangeKind::LocalEvents);

        self.push_to_mirror()
    }

    /// Delete the edited entry. For feed entries this only closes the
    /// editor; the feed item cannot be deleted and its annotations stay.
    pub fn delete(&mut self) -> Option<JoinHandle<()>> {
        let session = self.editor.take_session()?;

        if session.creating {
            self.drop_pending_create();
            return None;
        }

        if !merge::apply_delete(&mut self.locals, &session.entry) {
            return None;
        }

        self.invalidate();
        self.notifier.notify(ChangeKind::LocalEvents);
        self.push_to_mirror()
    }

    fn drop_pending_create(&mut self) {
        if self.pending_create.take().is_some() {
            self.invalidate();
        }
    }

    fn push_to_mirror(&self) -> Option<JoinHandle<()>> {
        let mirror = self.mirror.clone()?;
        Some(sync::spawn_push(
            mirror,
            self.owner_id.clone(),
            self.locals.list().to_vec(),
        ))
    }
}
