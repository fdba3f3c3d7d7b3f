//! The node-thread half of a session: lifecycle callback handling.
//!
//! [`NodeBridge`] is the session's implementation of the framework's
//! [`LifecycleCallbacks`] capability trait. The framework holds it only
//! through that trait; everything it touches lives in the shared
//! [`Channels`], so it carries no reference back to the session itself.

use std::sync::Arc;
use std::time::Duration;

use cobridge_common::{EngineSignal, NodeSignal};
use tracing::{debug, error, trace, warn};

use crate::framework::{FrameworkErrorKind, LifecycleCallbacks, NodeState};
use crate::session::Channels;

/// Callback receiver running on the node lifecycle thread.
pub(crate) struct NodeBridge {
    channels: Arc<Channels>,
    /// Bound on the ack waits inside callback bodies; `None` waits
    /// indefinitely.
    ack_timeout: Option<Duration>,
    node_name: String,
}

impl NodeBridge {
    pub(crate) fn new(
        channels: Arc<Channels>,
        ack_timeout: Option<Duration>,
        node_name: String,
    ) -> Self {
        NodeBridge {
            channels,
            ack_timeout,
            node_name,
        }
    }

    /// Announce a phase to the engine and wait for its DONE ack.
    ///
    /// The slot is cleared only if it still holds the DONE we observed;
    /// any other signal (an abort, a shutdown request) — including one
    /// posted over the ack after the wait returned — is left in place so
    /// the node thread's queued signal task can observe and act on it.
    fn signal_and_await_ack(&self, signal: NodeSignal) {
        trace!(node = %self.node_name, signal = signal.name(), "announcing phase");
        self.channels.to_engine.post(signal);

        match self.channels.to_node.wait_any(self.ack_timeout) {
            Some(EngineSignal::Done) => {
                self.channels.to_node.consume(EngineSignal::Done);
            }
            Some(other) => {
                debug!(
                    node = %self.node_name,
                    signal = other.name(),
                    "phase interrupted by engine signal"
                );
            }
            None => {
                warn!(
                    node = %self.node_name,
                    signal = signal.name(),
                    "engine did not acknowledge within the configured timeout"
                );
            }
        }
    }

    /// Quit escalation: force a session abort and make sure the engine
    /// observes it before control returns to the framework.
    ///
    /// The wait is deliberately indefinite — the engine's acknowledgment
    /// (typically the EXIT it posts while stopping the session) is the
    /// only way out, and returning earlier could let the framework tear
    /// the node down before the engine has seen the abort.
    fn ask_engine_to_quit(&self) {
        self.channels.to_node.reset();
        self.channels.to_engine.post(NodeSignal::Quit);
        let _ = self.channels.to_node.wait_any(None);
    }
}

impl LifecycleCallbacks for NodeBridge {
    fn on_initialization(&self) {
        self.signal_and_await_ack(NodeSignal::Start);
    }

    fn on_update_y(&self) {
        self.signal_and_await_ack(NodeSignal::UpdateY);
    }

    fn on_update_x(&self) {
        self.signal_and_await_ack(NodeSignal::UpdateX);
    }

    fn on_termination(&self) {
        // One-way notice: the engine picks it up at its next wait point.
        debug!(node = %self.node_name, "node terminating");
        self.channels.to_engine.post(NodeSignal::Terminate);
    }

    fn on_framework_error(&self, kind: FrameworkErrorKind, info: &str) {
        error!(
            node = %self.node_name,
            kind = kind.as_str(),
            info,
            "framework error, aborting session"
        );
        self.channels.node_state.set(NodeState::Error);
        self.ask_engine_to_quit();
    }

    fn on_framework_warning(&self, info: &str) {
        warn!(node = %self.node_name, info, "framework warning");
    }
}
