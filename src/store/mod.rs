//! Durable local state: user-owned events and per-feed-event overrides.
//!
//! Both stores follow the same persistence model: the whole collection is
//! loaded once and re-persisted as a unit on every mutation. In-memory
//! state is updated first and stays authoritative for the session even
//! when a durable write fails.

mod local_events;
mod overrides;

pub use local_events::LocalEventStore;
pub use overrides::{OverridePatch, OverrideRecord, OverrideStore};
