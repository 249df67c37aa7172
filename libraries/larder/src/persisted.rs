//! A piece of app state bound to the storage key it lives under.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AppState,
    data_model::Timestamped,
    storage::{KeyValueStorage, Store},
};

/// Every write-back goes through [`Persisted::dispatch`], so a collection is saved exactly once
/// per applied event and never from anywhere else.
#[derive(Clone, Debug)]
pub struct Persisted<S> {
    key: String,
    state: S,
}

impl<S> Persisted<S> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: Serialize + DeserializeOwned> Persisted<S> {
    pub fn load<B: KeyValueStorage>(store: &mut Store<B>, key: impl Into<String>, seed: S) -> Self {
        let key = key.into();
        let state = store.load(&key, seed);
        Self { key, state }
    }

    /// Drop whatever is stored and start over from the seed.
    pub fn reset<B: KeyValueStorage>(&mut self, store: &mut Store<B>, seed: S) {
        store.remove(&self.key);
        self.state = store.load(&self.key, seed);
    }
}

impl<S> Persisted<S>
where
    S: AppState + Default + Serialize,
{
    pub fn dispatch<B: KeyValueStorage>(&mut self, store: &mut Store<B>, event: &Timestamped<S::Event>) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply_event(event);
        store.save(&self.key, &self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartialAppState, data_model::Stamper, storage::MemoryStorage};

    #[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Tally {
        total: i64,
    }

    impl PartialAppState for Tally {
        type Event = i64;
        type Partial = Self;

        fn process_event(mut partial: Self, event: &Timestamped<i64>) -> Self {
            partial.total += event.event;
            partial
        }

        fn finalize(partial: Self) -> Self {
            partial
        }
    }

    #[test]
    fn test_dispatch_applies_and_saves() {
        let mut store = Store::new(MemoryStorage::new());
        let mut stamper = Stamper::new();
        let mut tally = Persisted::load(&mut store, "tally", Tally { total: 10 });

        tally.dispatch(&mut store, &stamper.stamp(5));
        tally.dispatch(&mut store, &stamper.stamp(-2));
        assert_eq!(tally.state().total, 13);

        let reloaded = Persisted::load(&mut store, "tally", Tally::default());
        assert_eq!(reloaded.state(), tally.state());
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut store = Store::new(MemoryStorage::new());
        let mut stamper = Stamper::new();
        let mut tally = Persisted::load(&mut store, "tally", Tally { total: 1 });
        tally.dispatch(&mut store, &stamper.stamp(100));

        tally.reset(&mut store, Tally { total: 1 });
        assert_eq!(tally.state().total, 1);
        assert_eq!(tally.key(), "tally");
    }
}
