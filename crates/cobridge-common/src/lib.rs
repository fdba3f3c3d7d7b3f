//! Common types and errors for the cobridge co-simulation bridge.
//!
//! This crate holds the vocabulary shared between the engine side and the
//! node side of the bridge: simulation time, the two signal enumerations
//! exchanged across the rendezvous mailboxes, and the error taxonomy.

mod error;
mod signal;
mod time;

pub use error::{ConfigError, ExchangeError, StartupError};
pub use signal::{EngineSignal, NodeSignal};
pub use time::SimTime;
