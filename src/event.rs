//! Core event types.
//!
//! These types represent timetable entries in a source-neutral way. Feed
//! events arrive pre-parsed from an external ICS collaborator as
//! [`RemoteEvent`]s, user-owned events live as [`LocalEvent`]s, and the UI
//! consumes the unified [`CalendarEntry`] produced by the merge layer.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EVENT_COLOR;

/// A point in time that is either a concrete instant or a whole day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// Resolve to a UTC instant. Whole-day values resolve to midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// ISO-8601 instant with millisecond precision and a `Z` suffix.
    pub fn to_iso(&self) -> String {
        self.to_utc().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parse an ISO-8601 instant or a plain `YYYY-MM-DD` date.
    pub fn parse_iso(value: &str) -> Option<EventTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(EventTime::DateTime(dt.with_timezone(&Utc)));
        }
        value.parse::<NaiveDate>().ok().map(EventTime::Date)
    }
}

/// Display kind of an entry, used for filtering and presentation defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    None,
    Course,
    Event,
}

/// An external, read-only calendar feed the user has subscribed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcalSubscription {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Default accent color for entries from this feed.
    pub color: String,
    /// Default display kind for entries from this feed, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_kind: Option<EntryKind>,
}

/// One parsed event from a feed refresh, as handed over by the external
/// ICS parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// The feed's own per-event UID. Malformed feeds may omit it.
    pub uid: Option<String>,
    /// Caller-supplied synthetic id used in place of a missing UID.
    /// Only stable for the current session.
    pub fallback_id: String,
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl RemoteEvent {
    /// The identity component used to key this event's annotations.
    pub fn effective_uid(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.fallback_id)
    }
}

/// A user-owned calendar event. Fully mutable, owned exclusively by the
/// local event store; the backend mirror is a downstream copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub id: String,
    pub full_title: String,
    pub title_abbr: String,
    #[serde(default)]
    pub is_title_abbr_custom: bool,
    pub start: EventTime,
    pub end: EventTime,
    pub color: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub hidden: bool,
}

/// Where a unified entry comes from, with the feed identity for entries
/// sourced from a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryOrigin {
    Local,
    Ical {
        subscription_id: String,
        event_uid: String,
        meta_key: String,
    },
}

/// One entry of the unified, UI-facing list. Periods are half-open
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Unique within the merged list for the current user and session.
    pub id: String,
    /// Short label actually rendered on the grid.
    pub title: String,
    pub full_title: String,
    pub title_abbr: String,
    pub is_title_abbr_custom: bool,
    pub start: EventTime,
    pub end: EventTime,
    /// Presentation accent, always populated.
    pub color: String,
    pub note: String,
    pub kind: EntryKind,
    pub hidden: bool,
    pub origin: EntryOrigin,
}

impl CalendarEntry {
    pub fn is_local(&self) -> bool {
        matches!(self.origin, EntryOrigin::Local)
    }

    pub fn is_ical(&self) -> bool {
        !self.is_local()
    }

    /// The annotation key, for feed-sourced entries.
    pub fn meta_key(&self) -> Option<&str> {
        match &self.origin {
            EntryOrigin::Local => None,
            EntryOrigin::Ical { meta_key, .. } => Some(meta_key),
        }
    }

    /// Identity transform from a local event, defaulting the color when
    /// the stored one is empty.
    pub fn from_local_event(event: &LocalEvent) -> Self {
        CalendarEntry {
            id: event.id.clone(),
            title: event.title_abbr.clone(),
            full_title: event.full_title.clone(),
            title_abbr: event.title_abbr.clone(),
            is_title_abbr_custom: event.is_title_abbr_custom,
            start: event.start.clone(),
            end: event.end.clone(),
            color: if event.color.is_empty() {
                DEFAULT_EVENT_COLOR.to_string()
            } else {
                event.color.clone()
            },
            note: event.note.clone(),
            kind: event.kind,
            hidden: event.hidden,
            origin: EntryOrigin::Local,
        }
    }
}
