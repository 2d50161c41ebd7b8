//! Conversion between local events and the backend mirror's row shape.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENT_COLOR, DEFAULT_EVENT_DURATION_MIN};
use crate::event::{EntryKind, EventTime, LocalEvent};
use crate::identity::make_title_abbr;

/// One row of the backend mirror's flat event table, keyed by user id.
/// Field names match the backend's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Only present when the user customized the abbreviation; readers
    /// derive it from `title` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_short: Option<String>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub display_type: EntryKind,
}

impl EntryRow {
    pub fn from_local_event(event: &LocalEvent, owner_id: &str) -> EntryRow {
        let (date, end_date) = to_period_iso(&event.start, &event.end);

        EntryRow {
            id: event.id.clone(),
            user_id: owner_id.to_string(),
            title: if event.full_title.is_empty() {
                event.title_abbr.clone()
            } else {
                event.full_title.clone()
            },
            title_short: event
                .is_title_abbr_custom
                .then(|| event.title_abbr.clone()),
            date,
            end_date: Some(end_date),
            note: (!event.note.is_empty()).then(|| event.note.clone()),
            color: Some(event.color.clone()),
            display_type: event.kind,
        }
    }

    /// Inverse of [`EntryRow::from_local_event`]. Returns `None` when the
    /// persisted period does not parse.
    pub fn into_local_event(self) -> Option<LocalEvent> {
        let start = EventTime::parse_iso(&self.date)?;
        let end = match &self.end_date {
            Some(raw) => EventTime::parse_iso(raw)?,
            None => EventTime::DateTime(
                start.to_utc() + Duration::minutes(DEFAULT_EVENT_DURATION_MIN),
            ),
        };

        let title_abbr = match &self.title_short {
            Some(abbr) => abbr.clone(),
            None => make_title_abbr(&self.title),
        };

        Some(LocalEvent {
            id: self.id,
            full_title: self.title,
            title_abbr,
            is_title_abbr_custom: self.title_short.is_some(),
            start,
            end,
            color: self
                .color
                .unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
            note: self.note.unwrap_or_default(),
            kind: self.display_type,
            hidden: false,
        })
    }
}

/// Normalize a period into ISO-8601 instants for storage and transport.
pub fn to_period_iso(start: &EventTime, end: &EventTime) -> (String, String) {
    (start.to_iso(), end.to_iso())
}
