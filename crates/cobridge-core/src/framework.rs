//! Seams to the external co-simulation node framework.
//!
//! The network transport, message serialization, and discovery all live
//! on the far side of [`CosimNode`]; this core only requires the narrow
//! surface below. The framework in turn drives the bridge exclusively
//! through the [`LifecycleCallbacks`] capability trait — it never sees
//! the session's concrete type.

use std::sync::atomic::{AtomicU8, Ordering};

use cobridge_common::{ExchangeError, SimTime, StartupError};
use parking_lot::{Mutex, MutexGuard};

/// Maximum number of doubles the engine can consume in one step.
///
/// This mirrors the fixed size of the engine's preallocated read buffer.
/// Exceeding it on an input read is a capacity error, never a silent
/// truncation.
pub const MAX_EXCHANGE_VALUES: usize = 1024;

/// A task queued onto the node thread's execution loop.
pub type CallbackTask = Box<dyn FnOnce() + Send>;

// ============================================================================
// Value Ports
// ============================================================================

/// A framework-owned, lock-protected buffer of double values.
///
/// The output port is written by the engine during the UPDATE_Y phase and
/// read by the node thread only after it observes DONE; the input port is
/// written by the node thread before it posts UPDATE_X and read by the
/// engine only after observing UPDATE_X. That alternation, enforced by
/// the mailbox handshake, is what keeps the two threads off the same
/// buffer at the same time; the port's own lock matches the framework's
/// lock-and-get access contract.
#[derive(Debug)]
pub struct ValuePort {
    name: String,
    values: Mutex<Vec<f64>>,
}

impl ValuePort {
    /// Create an empty port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        ValuePort {
            name: name.into(),
            values: Mutex::new(Vec::new()),
        }
    }

    /// Port name, as registered with the framework.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the port contents wholesale, resizing to the new count.
    pub fn replace(&self, values: &[f64]) {
        let mut buf = self.values.lock();
        buf.clear();
        buf.extend_from_slice(values);
    }

    /// Lock the port and access the raw buffer.
    pub fn lock(&self) -> MutexGuard<'_, Vec<f64>> {
        self.values.lock()
    }

    /// Snapshot the port contents, checked against the fixed capacity.
    ///
    /// Returns [`ExchangeError::CapacityExceeded`] when the port holds
    /// more than [`MAX_EXCHANGE_VALUES`] values.
    pub fn snapshot(&self) -> Result<Vec<f64>, ExchangeError> {
        let buf = self.values.lock();
        if buf.len() > MAX_EXCHANGE_VALUES {
            return Err(ExchangeError::CapacityExceeded {
                count: buf.len(),
                max: MAX_EXCHANGE_VALUES,
            });
        }
        Ok(buf.clone())
    }

    /// Number of values currently on the port.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether the port is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Node Lifecycle State
// ============================================================================

/// Lifecycle state of the node, mutated only from the node thread.
///
/// Readers on other threads see it eventually-consistent; it gates
/// diagnostics, not protocol correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Operating normally.
    Normal,
    /// A framework error was reported; the session is aborting.
    Error,
}

/// Atomic cell holding a [`NodeState`].
#[derive(Debug)]
pub(crate) struct NodeStateCell(AtomicU8);

impl NodeStateCell {
    pub(crate) fn new() -> Self {
        NodeStateCell(AtomicU8::new(0))
    }

    pub(crate) fn set(&self, state: NodeState) {
        let raw = match state {
            NodeState::Normal => 0,
            NodeState::Error => 1,
        };
        self.0.store(raw, Ordering::Release);
    }

    pub(crate) fn get(&self) -> NodeState {
        match self.0.load(Ordering::Acquire) {
            0 => NodeState::Normal,
            _ => NodeState::Error,
        }
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Lifecycle events the node framework delivers to the bridge.
///
/// Callbacks execute on the node thread (or are marshaled onto it by the
/// framework); they never share a thread with engine code. The bodies
/// deliberately block on the rendezvous mailboxes — bounded by the
/// session's configured timeout for the ack waits — so the framework
/// must tolerate a callback not returning immediately.
pub trait LifecycleCallbacks: Send + Sync {
    /// The node is initializing a new simulation run.
    fn on_initialization(&self);

    /// The framework requests the engine's current outputs.
    fn on_update_y(&self);

    /// The framework has new inputs ready on the input port.
    fn on_update_x(&self);

    /// The node's simulation is terminating normally. One-way notice.
    fn on_termination(&self);

    /// The framework reported an error; the session must abort.
    fn on_framework_error(&self, kind: FrameworkErrorKind, info: &str);

    /// The framework reported a non-fatal warning.
    fn on_framework_warning(&self, info: &str) {
        let _ = info;
    }
}

/// Classes of framework-reported errors.
///
/// All of them funnel into the same quit escalation; the kind only feeds
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkErrorKind {
    /// A raw message could not be parsed into a structured message.
    RawMessage,
    /// A structured message held values of the wrong type or dimension.
    ValueDecode,
    /// A value could not be serialized or sent.
    Send,
    /// A fatal error inside the framework itself.
    Fatal,
}

impl FrameworkErrorKind {
    /// Short label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            FrameworkErrorKind::RawMessage => "raw-message",
            FrameworkErrorKind::ValueDecode => "value-decode",
            FrameworkErrorKind::Send => "send",
            FrameworkErrorKind::Fatal => "fatal",
        }
    }
}

/// The external co-simulation endpoint, as this core sees it.
///
/// At most one live node exists per session. All methods must be safe to
/// call from the thread the framework invokes callbacks on, as well as
/// from the engine thread.
pub trait CosimNode: Send + Sync {
    /// Node name on the co-simulation network.
    fn name(&self) -> &str;

    /// Open the transport port and register the input/output value ports.
    ///
    /// Called once, before the lifecycle thread starts. Failure here
    /// means the session is never created.
    fn connect(&self) -> Result<(), StartupError>;

    /// Run the node's execution loop until the simulation stops.
    ///
    /// Blocks for the node's entire run; invoked on the dedicated
    /// lifecycle thread. All lifecycle events are delivered through
    /// `callbacks`.
    fn run(&self, callbacks: std::sync::Arc<dyn LifecycleCallbacks>);

    /// Ask the execution loop to stop cleanly.
    fn stop_simulation(&self);

    /// Queue a task onto the node thread's execution loop.
    ///
    /// The task runs between framework events, not concurrently with a
    /// callback. This is how the engine makes the node thread act on a
    /// signal when the thread is blocked inside framework code rather
    /// than inside this protocol.
    fn post_callback_event(&self, task: CallbackTask);

    /// The node's current simulated time.
    fn current_sim_time(&self) -> SimTime;

    /// The output port (engine writes, node reads).
    fn output_port(&self) -> &ValuePort;

    /// The input port (node writes, engine reads).
    fn input_port(&self) -> &ValuePort;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_replace_resizes() {
        let port = ValuePort::new("out");
        port.replace(&[1.0, 2.0, 3.0]);
        assert_eq!(port.len(), 3);

        port.replace(&[4.0]);
        assert_eq!(*port.lock(), vec![4.0]);

        port.replace(&[]);
        assert!(port.is_empty());
    }

    #[test]
    fn test_snapshot_at_capacity_succeeds() {
        let port = ValuePort::new("in");
        port.replace(&vec![0.5; MAX_EXCHANGE_VALUES]);

        let values = port.snapshot().expect("at-capacity snapshot should succeed");
        assert_eq!(values.len(), MAX_EXCHANGE_VALUES);
    }

    #[test]
    fn test_snapshot_over_capacity_is_an_error() {
        let port = ValuePort::new("in");
        port.replace(&vec![0.5; MAX_EXCHANGE_VALUES + 1]);

        match port.snapshot() {
            Err(ExchangeError::CapacityExceeded { count, max }) => {
                assert_eq!(count, MAX_EXCHANGE_VALUES + 1);
                assert_eq!(max, MAX_EXCHANGE_VALUES);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn test_node_state_cell() {
        let cell = NodeStateCell::new();
        assert_eq!(cell.get(), NodeState::Normal);
        cell.set(NodeState::Error);
        assert_eq!(cell.get(), NodeState::Error);
    }
}
