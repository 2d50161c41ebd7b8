//! The entry editor state machine.
//!
//! Strictly single-document: `Closed` -> `Open` -> `ConfirmingDiscard` ->
//! `Closed`. The confirmation state remembers *how* the close was
//! requested, because canceling it behaves differently per path: a close
//! button never dismissed anything, so Cancel just stays open, while a
//! swipe gesture has already dismissed the surface by the time dirtiness
//! is checked, so Cancel must direct the UI to re-present the editor.

use crate::constants::DEFAULT_EVENT_COLOR;
use crate::event::{CalendarEntry, EntryKind, EventTime};
use crate::identity::{clamp_abbr, make_title_abbr};

/// How a close was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAttempt {
    /// The explicit close button.
    Button,
    /// An implicit dismissal of the editor surface (swipe-to-dismiss).
    Swipe,
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The draft is dirty; the UI must present Cancel/Discard/Apply.
    ConfirmationRequired,
}

/// Result of canceling the discard confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The editor never went away; nothing to re-present.
    StayOpen,
    /// The surface was already dismissed by the gesture; the UI must
    /// re-present the editor with the draft intact.
    ReopenEditor,
}

/// The in-memory working copy of an entry's editable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDraft {
    pub full_title: String,
    pub title_abbr: String,
    pub from: EventTime,
    pub until: EventTime,
    pub note: String,
    pub color: String,
    pub kind: EntryKind,
}

/// Partial update for the open draft.
#[derive(Debug, Clone, Default)]
pub struct DraftPatch {
    pub full_title: Option<String>,
    pub title_abbr: Option<String>,
    pub from: Option<EventTime>,
    pub until: Option<EventTime>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Clone)]
pub(crate) struct EditSession {
    pub(crate) entry: CalendarEntry,
    pub(crate) draft: EditorDraft,
    initial_draft: EditorDraft,
    pub(crate) has_custom_abbr: bool,
    initial_custom_abbr: bool,
    pub(crate) creating: bool,
    confirming: Option<CloseAttempt>,
}

/// The editor controller. One draft at a time; dirtiness is a structural
/// comparison against the state captured at open time.
#[derive(Debug, Default)]
pub struct Editor {
    session: Option<EditSession>,
}

impl Editor {
    /// Open `entry` for editing, seeding the draft from its current
    /// merged view. An empty abbreviation is auto-derived from the full
    /// title.
    pub fn open(&mut self, entry: &CalendarEntry, creating: bool) {
        let title_abbr = if entry.title_abbr.is_empty() {
            clamp_abbr(&make_title_abbr(&entry.full_title))
        } else {
            clamp_abbr(&entry.title_abbr)
        };

        let draft = EditorDraft {
            full_title: entry.full_title.clone(),
            title_abbr,
            from: entry.start.clone(),
            until: entry.end.clone(),
            note: entry.note.clone(),
            color: if entry.color.is_empty() {
                DEFAULT_EVENT_COLOR.to_string()
            } else {
                entry.color.clone()
            },
            kind: entry.kind,
        };

        self.session = Some(EditSession {
            entry: entry.clone(),
            initial_draft: draft.clone(),
            draft,
            has_custom_abbr: entry.is_title_abbr_custom,
            initial_custom_abbr: entry.is_title_abbr_custom,
            creating,
            confirming: None,
        });
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn draft(&self) -> Option<&EditorDraft> {
        self.session.as_ref().map(|s| &s.draft)
    }

    pub fn entry(&self) -> Option<&CalendarEntry> {
        self.session.as_ref().map(|s| &s.entry)
    }

    pub fn is_ical_editing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.entry.is_ical())
    }

    pub fn is_creating_new(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.creating)
    }

    /// Which close attempt is awaiting confirmation, if any.
    pub fn confirming_discard(&self) -> Option<CloseAttempt> {
        self.session.as_ref().and_then(|s| s.confirming)
    }

    pub fn is_dirty(&self) -> bool {
        self.session.as_ref().is_some_and(|s| {
            s.draft != s.initial_draft || s.has_custom_abbr != s.initial_custom_abbr
        })
    }

    /// Shallow-merge `patch` into the open draft.
    ///
    /// Editing the full title re-derives the abbreviation until the user
    /// has diverged it; a direct abbreviation edit diverges it for good.
    /// For feed-sourced entries the immutable fields (`full_title`,
    /// `from`, `until`) are dropped without effect.
    pub fn update_form(&mut self, patch: DraftPatch) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let ical = session.entry.is_ical();

        if let Some(full_title) = patch.full_title {
            if !ical {
                if !session.has_custom_abbr && patch.title_abbr.is_none() {
                    session.draft.title_abbr = clamp_abbr(&make_title_abbr(&full_title));
                }
                session.draft.full_title = full_title;
            }
        }
        if let Some(title_abbr) = patch.title_abbr {
            session.draft.title_abbr = clamp_abbr(&title_abbr);
            session.has_custom_abbr = true;
        }
        if let Some(from) = patch.from {
            if !ical {
                session.draft.from = from;
            }
        }
        if let Some(until) = patch.until {
            if !ical {
                session.draft.until = until;
            }
        }
        if let Some(note) = patch.note {
            session.draft.note = note;
        }
        if let Some(color) = patch.color {
            session.draft.color = color;
        }
        if let Some(kind) = patch.kind {
            session.draft.kind = kind;
        }
    }

    /// Ask to close the editor. A clean draft closes immediately; a dirty
    /// one transitions to the discard confirmation for this attempt.
    pub fn request_close(&mut self, attempt: CloseAttempt) -> CloseOutcome {
        if self.session.is_none() {
            return CloseOutcome::Closed;
        }

        if !self.is_dirty() {
            self.session = None;
            return CloseOutcome::Closed;
        }

        if let Some(session) = self.session.as_mut() {
            session.confirming = Some(attempt);
        }
        CloseOutcome::ConfirmationRequired
    }

    /// Cancel a pending discard confirmation, keeping the draft.
    pub fn cancel_close(&mut self) -> CancelOutcome {
        let Some(session) = self.session.as_mut() else {
            return CancelOutcome::StayOpen;
        };

        match session.confirming.take() {
            Some(CloseAttempt::Swipe) => CancelOutcome::ReopenEditor,
            _ => CancelOutcome::StayOpen,
        }
    }

    /// Consume the session for an intentional close (save, delete,
    /// discard, apply-from-confirmation). Bypasses any dirty gating, so
    /// no further confirmation can chain off the resulting dismissal.
    pub(crate) fn take_session(&mut self) -> Option<EditSession> {
        self.session.take()
    }
}
