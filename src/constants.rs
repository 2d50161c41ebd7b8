//! Engine-wide constants.

/// Accent color applied when an event or subscription carries none.
pub const DEFAULT_EVENT_COLOR: &str = "#4dabf7";

/// Duration assumed for backend rows that persist no end timestamp.
pub const DEFAULT_EVENT_DURATION_MIN: i64 = 60;

/// Title used when an event is saved with an empty title.
pub const UNTITLED_EVENT_TITLE: &str = "Untitled";

/// Maximum length of a title abbreviation, in characters.
pub const TITLE_ABBR_MAX_CHARS: usize = 4;

/// Soft bound on the number of annotated feed events. New annotations past
/// this point are dropped with a warning; existing ones stay editable.
pub const OVERRIDE_SOFT_CAP: usize = 4096;
