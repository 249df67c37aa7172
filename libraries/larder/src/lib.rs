//! Local-first state snapshots for client apps.
//! It was created for DevPulse, so it doesn't include much that was not needed for that project.
//!
//! Strategy:
//! 1. Each collection of app state lives under one storage key as a single JSON document.
//! 2. The app never edits that state directly. User actions are stamped into events, and the events are "applied" to the state.
//! 3. After every applied event the whole document is written back. Writes are best-effort: a failed write is logged and the in-memory state stays authoritative.
//! 4. On load, a missing, empty, or corrupt document is replaced with seed data, so the app always has something to render.

pub mod data_model;
pub mod persisted;
pub mod storage;

#[cfg(target_arch = "wasm32")]
#[cfg(feature = "web")]
pub mod local_storage;

use crate::data_model::Timestamped;

pub use persisted::Persisted;
pub use storage::{DirectoryStorage, KeyValueStorage, MemoryStorage, StorageError, Store};

/// Core trait for partial event processing without derived state computation
pub trait PartialAppState: Sized {
    type Event;

    /// The intermediate state type returned by process_event.
    /// For simple cases, this can just be Self.
    type Partial: Sized;

    /// Process an event partially, without computing derived state.
    fn process_event(partial: Self::Partial, event: &Timestamped<Self::Event>) -> Self::Partial;

    /// Finalize the state by computing any derived state.
    /// This is called once after all events have been processed.
    fn finalize(partial: Self::Partial) -> Self;
}

/// Extension trait that provides apply_event
pub trait AppState: PartialAppState {
    /// Apply a single event completely, including finalization.
    fn apply_event(self, event: &Timestamped<Self::Event>) -> Self;

    /// Apply events in order, finalizing once at the end.
    fn apply_events<'a>(self, events: impl IntoIterator<Item = &'a Timestamped<Self::Event>>) -> Self
    where
        Self::Event: 'a;
}

/// Blanket implementation: anything that can convert Self -> Partial gets apply_event automatically
impl<T> AppState for T
where
    T: PartialAppState,
    T::Partial: From<T>,
{
    fn apply_event(self, event: &Timestamped<Self::Event>) -> Self {
        let partial = T::Partial::from(self);
        let partial = T::process_event(partial, event);
        T::finalize(partial)
    }

    fn apply_events<'a>(self, events: impl IntoIterator<Item = &'a Timestamped<Self::Event>>) -> Self
    where
        Self::Event: 'a,
    {
        let mut partial = T::Partial::from(self);
        for event in events {
            partial = T::process_event(partial, event);
        }
        T::finalize(partial)
    }
}
