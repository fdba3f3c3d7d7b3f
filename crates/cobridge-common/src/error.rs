//! Error taxonomy for the co-simulation bridge.

use thiserror::Error;

use crate::NodeSignal;

/// Errors parsing the node configuration source.
///
/// Any of these fails startup: the node is never created.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The transport line (first line) is missing or empty.
    #[error("missing transport line in configuration")]
    MissingTransportLine,

    /// The node line (second line) is missing or empty.
    #[error("missing node name line in configuration")]
    MissingNodeLine,

    /// The transport selector is not one this bridge supports.
    #[error("unsupported transport {0:?} (only \"mqtt\" is supported)")]
    UnsupportedTransport(String),

    /// The node name fails the validity predicate.
    #[error("invalid node name {0:?}")]
    InvalidNodeName(String),

    /// The `timeout` option value is not a parseable integer.
    #[error("invalid timeout value {0:?}")]
    InvalidTimeout(String),
}

/// Errors starting a co-simulation session.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The node's transport port could not be opened or its value ports
    /// could not be registered.
    #[error("transport setup failed: {0}")]
    Transport(String),

    /// The node lifecycle thread could not be spawned.
    #[error("failed to spawn node thread: {0}")]
    Spawn(std::io::Error),
}

/// Errors surfaced by the exchange gateway for one engine step.
///
/// All of these are recovered at the phase boundary and returned to the
/// engine; none aborts the process. Normal and abnormal node termination
/// are not errors (they are step outcomes, see the session API).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// No node session exists (never started, or already stopped).
    #[error("no co-simulation node is running")]
    NoNode,

    /// A mailbox wait expired without the expected signal.
    #[error("timed out waiting for the co-simulation node")]
    Timeout,

    /// A signal other than the one the phase expects was observed.
    #[error("unexpected signal {} at a handshake wait point", .0.name())]
    UnexpectedSignal(NodeSignal),

    /// The node produced more input values than the engine can consume.
    /// The step is aborted without acknowledging the node.
    #[error("input count {count} exceeds the maximum of {max} values")]
    CapacityExceeded {
        /// Number of values on the input port.
        count: usize,
        /// Fixed maximum the engine side can consume.
        max: usize,
    },
}
