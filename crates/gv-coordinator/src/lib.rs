//! Persistent per-transaction signing-ceremony state machine (spec §3-§5):
//! the `Store`/`PubSub` trait contracts, `CoordinatorContext` (the crate's
//! one entry point), the signing-plane wire types, and the timeout
//! sweeper. `gv-coordinator-server` is the only thing that ever
//! constructs a `CoordinatorContext` outside tests.

pub mod admin;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod model;
pub mod pubsub;
pub mod store;
pub mod sweeper;
pub mod wire;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub use admin::{GuardianDirectory, VaultDirectory, VaultStats};
pub use config::CoordinatorConfig;
pub use context::{CoordinatorContext, NewTransactionRequest};
pub use error::CoordinatorError;
pub use pubsub::{PubSub, RoomReceiver, Rooms};
pub use store::{InMemoryStore, Round1SubmitOutcome, Round3SubmitOutcome, Store};
pub use sweeper::run_sweeper;

#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
