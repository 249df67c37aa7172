//! The DevPulse client core.
//!
//! Every page keeps its state as a document in a [`larder::Store`]. User actions are stamped,
//! applied, and saved through a single [`Session`]; the server only ever hears about them
//! afterwards, and only on a best-effort basis.

pub mod api;
pub mod comments;
pub mod config;
pub mod counters;
pub mod explore;
pub mod feed;
pub mod ledger;
pub mod media;
pub mod notifications;
pub mod profile;
pub mod rank;
pub mod repos;
pub mod session;
pub mod settings;
pub mod ui;

use std::sync::LazyLock;

pub use api::{ApiClient, ApiError};
pub use config::{Config, ConfigError};
pub use counters::{Membership, Tally};
pub use ledger::{SubjectId, VoteDirection, VoteLedger, VoteTransition};
pub use rank::{Rankable, SortMode, rank};
pub use session::Session;

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());

    #[cfg(not(target_arch = "wasm32"))]
    if env_logger::try_init().is_err() {
        return;
    }

    log::info!("Logging initialized");
});

/// Install the platform logger. Safe to call any number of times.
pub fn init_logging() {
    LazyLock::force(&LOGGER);
}
