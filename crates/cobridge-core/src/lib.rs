//! Rendezvous core for bridging a building-simulation engine to an
//! external co-simulation framework.
//!
//! On every simulation step the engine hands off its outputs, blocks until
//! the co-simulation partner has consumed them and produced new inputs,
//! then resumes. Two threads participate: the engine's simulation thread
//! and the node lifecycle thread that runs the co-simulation framework's
//! execution loop. All cross-thread coordination goes through a pair of
//! single-slot [`SignalMailbox`]es plus the node's value ports.
//!
//! ## Key Types
//!
//! - [`SignalMailbox`]: single-slot, overwrite-on-set signal holder with
//!   blocking, timeout-capable waits
//! - [`Session`]: owns both mailboxes, the node handle, and the lifecycle
//!   thread; its [`Session::exchange`] method is the one entry point the
//!   engine calls per step
//! - [`CosimNode`] / [`LifecycleCallbacks`]: the narrow seams to the
//!   external node framework (transport, serialization, and discovery
//!   stay on the far side of them)
//! - [`LoopbackNode`]: in-process framework implementation for tests and
//!   the demo runner
//!
//! ## One step
//!
//! ```text
//! engine thread                       node thread
//! ------------------------------      ------------------------------
//! exchange(outputs)
//!   wait UPDATE_Y  <---------------   on_update_y: post UPDATE_Y
//!   write output port                   wait DONE
//!   post DONE      --------------->     (resumes, computes inputs)
//!   wait UPDATE_X  <---------------   on_update_x: post UPDATE_X
//!   read input port, sim time           wait DONE
//!   post DONE      --------------->     (resumes, next step)
//! ```

pub mod config;
pub mod framework;
pub mod gateway;
pub mod loopback;
pub mod mailbox;
pub mod session;

mod lifecycle;

pub use cobridge_common::{
    ConfigError, EngineSignal, ExchangeError, NodeSignal, SimTime, StartupError,
};
pub use config::{NodeConfig, Transport};
pub use framework::{
    CallbackTask, CosimNode, FrameworkErrorKind, LifecycleCallbacks, NodeState, ValuePort,
    MAX_EXCHANGE_VALUES,
};
pub use loopback::{LoopbackDriver, LoopbackNode};
pub use mailbox::SignalMailbox;
pub use session::{ExchangeReply, Session, SessionConfig};
