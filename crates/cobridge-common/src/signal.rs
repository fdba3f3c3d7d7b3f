//! Signal enumerations exchanged between the engine and the node thread.
//!
//! One simulation step is a strictly lockstep conversation, so each
//! direction carries at most one in-flight signal at a time. Signals are
//! posted through single-slot mailboxes (see `cobridge-core`); the `None`
//! variant is the empty-slot sentinel, never a real message.

use std::fmt;

/// Signals posted by the engine thread, consumed by the node thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// Empty slot; no signal pending.
    None,
    /// The engine finished processing the current phase (the protocol ack).
    Done,
    /// The engine's owner requested an abort.
    Quit,
    /// The engine requested node shutdown (stop the execution loop and exit).
    Exit,
    /// The engine is terminating its own simulation.
    Terminate,
}

impl EngineSignal {
    /// Human-readable signal name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            EngineSignal::None => "NONE",
            EngineSignal::Done => "DONE",
            EngineSignal::Quit => "QUIT",
            EngineSignal::Exit => "EXIT",
            EngineSignal::Terminate => "TERMINATE",
        }
    }
}

impl fmt::Display for EngineSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signals posted by the node thread, consumed by the engine thread.
///
/// All variants except [`NodeSignal::Timeout`] originate from framework
/// callbacks on the node thread. `Timeout` is synthesized locally by the
/// waiting side when a mailbox wait expires; it is never posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSignal {
    /// Empty slot; no signal pending.
    None,
    /// The node is initializing a new simulation run.
    Start,
    /// The node requests the engine's outputs (UPDATE_Y phase).
    UpdateY,
    /// The node has new inputs ready to be pulled (UPDATE_X phase).
    UpdateX,
    /// The node's simulation terminated normally.
    Terminate,
    /// The node aborted; the session is over.
    Quit,
    /// Synthetic: a wait on the node expired without a signal.
    Timeout,
}

impl NodeSignal {
    /// Human-readable signal name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            NodeSignal::None => "NONE",
            NodeSignal::Start => "START",
            NodeSignal::UpdateY => "UPDATE_Y",
            NodeSignal::UpdateX => "UPDATE_X",
            NodeSignal::Terminate => "TERMINATE",
            NodeSignal::Quit => "QUIT",
            NodeSignal::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for NodeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(EngineSignal::Done.name(), "DONE");
        assert_eq!(NodeSignal::UpdateY.name(), "UPDATE_Y");
        assert_eq!(NodeSignal::UpdateX.name(), "UPDATE_X");
        assert_eq!(format!("{}", NodeSignal::Timeout), "TIMEOUT");
    }
}
