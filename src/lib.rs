//! Timetable reconciliation and editing engine.
//!
//! Merges user-owned calendar events with read-only, externally-subscribed
//! iCal feed events, layers a persistent per-event override store on top of
//! the feeds, and exposes one uniform edit surface that routes mutations by
//! entry origin. Writes are local-first: in-memory state is authoritative,
//! durability is write-through, and mirroring to the backend is an
//! asynchronous, best-effort full-state push.
//!
//! The host app supplies parsed feed events (ICS fetching/parsing is an
//! external collaborator), the owning user id, and a [`CalendarMirror`]
//! implementation for the backend.

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod event;
pub mod identity;
pub mod mapping;
pub mod merge;
pub mod notify;
pub mod store;
pub mod sync;
pub mod timetable;

pub use config::UnitableConfig;
pub use editor::{CancelOutcome, CloseAttempt, CloseOutcome, DraftPatch, Editor, EditorDraft};
pub use error::{TimetableError, TimetableResult};
pub use event::{
    CalendarEntry, EntryKind, EntryOrigin, EventTime, IcalSubscription, LocalEvent, RemoteEvent,
};
pub use mapping::EntryRow;
pub use merge::{EntryPatch, Feed};
pub use notify::ChangeKind;
pub use store::{LocalEventStore, OverridePatch, OverrideRecord, OverrideStore};
pub use sync::CalendarMirror;
pub use timetable::Timetable;
