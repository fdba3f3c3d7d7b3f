//! One co-simulation session: mailboxes, node handle, lifecycle thread.
//!
//! A [`Session`] is the engine side of the bridge. It owns the pair of
//! rendezvous mailboxes, the node handle, and the lifecycle thread that
//! runs the node's execution loop. The engine drives it from a single
//! thread, one [`Session::exchange`] call per simulation step.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cobridge_common::{EngineSignal, ExchangeError, NodeSignal, SimTime, StartupError};
use tracing::{debug, trace};

use crate::config::NodeConfig;
use crate::framework::{CosimNode, NodeState, NodeStateCell};
use crate::lifecycle::NodeBridge;
use crate::mailbox::SignalMailbox;

/// Shared synchronization state between the engine half and the node
/// thread's callback half of a session.
#[derive(Debug)]
pub(crate) struct Channels {
    /// Engine → node signals (acks, shutdown requests).
    pub(crate) to_node: SignalMailbox<EngineSignal>,
    /// Node → engine signals (phase announcements, termination).
    pub(crate) to_engine: SignalMailbox<NodeSignal>,
    /// Node lifecycle state, written only from the node thread.
    pub(crate) node_state: NodeStateCell,
}

impl Channels {
    fn new() -> Self {
        Channels {
            to_node: SignalMailbox::new(),
            to_engine: SignalMailbox::new(),
            node_state: NodeStateCell::new(),
        }
    }
}

/// Session parameters, typically derived from a [`NodeConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Node name, used for the lifecycle thread name and logging.
    pub node_name: String,
    /// Default wait timeout for every mailbox wait; `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
    /// Whether the embedding engine should quit when the node's
    /// simulation terminates.
    pub quit_engine_on_terminate: bool,
}

impl From<&NodeConfig> for SessionConfig {
    fn from(config: &NodeConfig) -> Self {
        SessionConfig {
            node_name: config.name.clone(),
            timeout: config.timeout,
            quit_engine_on_terminate: config.quit_engine_on_terminate,
        }
    }
}

/// Outcome of one successful exchange call.
///
/// Node termination is a step outcome, not an error: the engine still
/// needs to distinguish "no more steps, wind down" from "this step
/// failed".
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeReply {
    /// The step completed; new inputs and the node's simulated time.
    Step {
        /// Input values pulled from the node's input port.
        values: Vec<f64>,
        /// The node's current simulated time.
        sim_time: SimTime,
    },
    /// The node's simulation terminated normally. Input buffers are
    /// untouched.
    Terminated,
    /// The node aborted the session. Input buffers are untouched.
    Aborted,
}

/// The engine side of a running co-simulation session.
///
/// Created by [`Session::start`] once the node's transport port is open
/// and its value ports are registered. Reentrant across steps but driven
/// by a single engine thread, one call at a time.
pub struct Session {
    channels: Arc<Channels>,
    node: Arc<dyn CosimNode>,
    thread: Option<JoinHandle<()>>,
    timeout: Option<Duration>,
    quit_engine_on_terminate: bool,
}

impl Session {
    /// Connect the node and start its lifecycle thread.
    ///
    /// The thread runs the node's execution loop for the node's entire
    /// run; lifecycle callbacks arrive on it, never on the engine
    /// thread.
    pub fn start(node: Arc<dyn CosimNode>, config: SessionConfig) -> Result<Self, StartupError> {
        node.connect()?;

        let channels = Arc::new(Channels::new());
        let bridge = Arc::new(NodeBridge::new(
            Arc::clone(&channels),
            config.timeout,
            config.node_name.clone(),
        ));

        let run_node = Arc::clone(&node);
        let thread = thread::Builder::new()
            .name(format!("cosim-node-{}", config.node_name))
            .spawn(move || {
                run_node.run(bridge);
                debug!("node execution loop finished");
            })
            .map_err(StartupError::Spawn)?;

        Ok(Session {
            channels,
            node,
            thread: Some(thread),
            timeout: config.timeout,
            quit_engine_on_terminate: config.quit_engine_on_terminate,
        })
    }

    /// Whether a node lifecycle thread exists for this session.
    pub fn has_node(&self) -> bool {
        self.thread.is_some()
    }

    /// The node's lifecycle state, as last written by the node thread.
    pub fn node_state(&self) -> NodeState {
        self.channels.node_state.get()
    }

    /// Whether the engine should quit once the node terminates, per the
    /// session configuration.
    pub fn quit_engine_on_terminate(&self) -> bool {
        self.quit_engine_on_terminate
    }

    /// Complete the node's initialization handshake.
    ///
    /// Blocks until the node announces START (bounded by the configured
    /// timeout) and acknowledges it, letting the node proceed to its
    /// first step.
    pub fn await_start(&self) -> Result<(), ExchangeError> {
        if !self.has_node() {
            return Err(ExchangeError::NoNode);
        }
        let sig = self.wait_node_signal();
        self.channels.to_engine.reset();
        if sig == NodeSignal::Timeout {
            return Err(ExchangeError::Timeout);
        }
        if sig != NodeSignal::Start {
            return Err(ExchangeError::UnexpectedSignal(sig));
        }
        self.channels.to_node.post(EngineSignal::Done);
        debug!("node initialization acknowledged");
        Ok(())
    }

    /// Exchange one step of data with the node.
    ///
    /// Performs the full 4-phase handshake: wait for UPDATE_Y, publish
    /// `outputs` on the output port, acknowledge, wait for UPDATE_X,
    /// snapshot the input port and the node's simulated time,
    /// acknowledge. Any other signal at either wait point short-circuits
    /// the step.
    ///
    /// On a capacity error the final acknowledgment is deliberately not
    /// posted — the protocol must not continue when the engine cannot
    /// consume all values — which leaves the node thread blocked; the
    /// caller is expected to treat this as session-fatal and stop the
    /// session.
    pub fn exchange(&self, outputs: &[f64]) -> Result<ExchangeReply, ExchangeError> {
        if !self.has_node() {
            return Err(ExchangeError::NoNode);
        }
        let channels = &self.channels;

        // Phase 1: wait for the node to request outputs.
        let sig = self.wait_node_signal();
        channels.to_engine.reset();
        if sig != NodeSignal::UpdateY {
            return short_circuit(sig);
        }

        // Phase 2: publish outputs, then ack so the node can read them.
        trace!(count = outputs.len(), "publishing outputs");
        self.node.output_port().replace(outputs);
        channels.to_node.post(EngineSignal::Done);

        // Phase 3: wait for the node to announce new inputs.
        let sig = self.wait_node_signal();
        channels.to_engine.reset();
        if sig != NodeSignal::UpdateX {
            return short_circuit(sig);
        }

        // Phase 4: consume inputs and the node's simulated time, then ack
        // so the node can proceed to the next step. No ack on capacity
        // overflow.
        let values = self.node.input_port().snapshot()?;
        let sim_time = self.node.current_sim_time();
        channels.to_node.post(EngineSignal::Done);

        trace!(count = values.len(), %sim_time, "step complete");
        Ok(ExchangeReply::Step { values, sim_time })
    }

    /// Post a signal to the node, and for anything other than an ack,
    /// queue a task so the node thread acts on it even when it is blocked
    /// inside framework code rather than inside this protocol.
    pub fn signal_node(&self, signal: EngineSignal) {
        debug!(signal = signal.name(), "signaling node");
        self.channels.to_node.post(signal);

        if signal != EngineSignal::Done && signal != EngineSignal::None {
            let channels = Arc::clone(&self.channels);
            let node = Arc::clone(&self.node);
            self.node.post_callback_event(Box::new(move || {
                // Read-and-reset under one lock so a concurrent post is
                // not lost between the read and the reset.
                let sig = channels.to_node.take();
                debug!(signal = sig.name(), "node thread handling engine signal");
                if matches!(sig, EngineSignal::Terminate | EngineSignal::Exit) {
                    node.stop_simulation();
                }
            }));
        }
    }

    /// Stop the node and join its lifecycle thread.
    ///
    /// Must only be called from the owning controller, never from a
    /// callback running on the node thread (self-join deadlock).
    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.signal_node(EngineSignal::Exit);
            if thread.join().is_err() {
                debug!("node thread panicked during shutdown");
            }
        }
    }

    fn wait_node_signal(&self) -> NodeSignal {
        self.channels
            .to_engine
            .wait_any(self.timeout)
            .unwrap_or(NodeSignal::Timeout)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Map a non-phase signal at a handshake wait point to the step outcome.
///
/// The phase's mailbox has already been reset by the caller, so the
/// protocol does not re-trigger on the next call.
fn short_circuit(signal: NodeSignal) -> Result<ExchangeReply, ExchangeError> {
    match signal {
        NodeSignal::Terminate => {
            debug!("node terminated normally");
            Ok(ExchangeReply::Terminated)
        }
        NodeSignal::Quit => {
            debug!("node aborted the session");
            Ok(ExchangeReply::Aborted)
        }
        NodeSignal::Timeout => Err(ExchangeError::Timeout),
        other => Err(ExchangeError::UnexpectedSignal(other)),
    }
}
