//! In-process co-simulation framework for tests and demos.
//!
//! [`LoopbackNode`] implements [`CosimNode`] without any network: a
//! [`LoopbackDriver`] stands in for the co-simulation network, feeding
//! the node's execution loop the same event sequence a live framework
//! would (initialize, then one UPDATE_Y/UPDATE_X cycle per step, then
//! terminate). Inputs are computed from the engine's outputs by a
//! caller-supplied transform, so tests can script exact round-trips.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cobridge_common::{SimTime, StartupError};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::trace;

use crate::framework::{
    CallbackTask, CosimNode, FrameworkErrorKind, LifecycleCallbacks, ValuePort,
};

/// Computes the node's next inputs from the engine's outputs and the
/// node's simulated time after the step.
pub type InputTransform = dyn Fn(&[f64], SimTime) -> Vec<f64> + Send + Sync;

/// Events driving the loopback node's execution loop.
enum LoopbackCommand {
    /// Run one update cycle, advancing simulated time by `step`.
    Advance { step: SimTime },
    /// Terminate the node's simulation normally.
    Terminate,
    /// Report a framework error to the bridge.
    InjectError {
        kind: FrameworkErrorKind,
        info: String,
    },
    /// A queued callback task (see [`CosimNode::post_callback_event`]).
    Task(CallbackTask),
}

/// Network-less co-simulation node.
pub struct LoopbackNode {
    name: String,
    input: ValuePort,
    output: ValuePort,
    sim_time: Mutex<SimTime>,
    transform: Box<InputTransform>,
    cmd_tx: Sender<LoopbackCommand>,
    cmd_rx: Receiver<LoopbackCommand>,
    connected: AtomicBool,
    stopped: AtomicBool,
    steps_driven: AtomicU64,
}

impl LoopbackNode {
    /// Create a loopback node and the driver that feeds it events.
    pub fn new(
        name: impl Into<String>,
        transform: Box<InputTransform>,
    ) -> (Arc<Self>, LoopbackDriver) {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let node = Arc::new(LoopbackNode {
            name: name.into(),
            input: ValuePort::new("in"),
            output: ValuePort::new("out"),
            sim_time: Mutex::new(SimTime::ZERO),
            transform,
            cmd_tx: cmd_tx.clone(),
            cmd_rx,
            connected: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            steps_driven: AtomicU64::new(0),
        });
        (node, LoopbackDriver { cmd_tx })
    }

    /// Convenience: a node whose inputs echo the engine's outputs.
    pub fn echo(name: impl Into<String>) -> (Arc<Self>, LoopbackDriver) {
        Self::new(name, Box::new(|outputs, _| outputs.to_vec()))
    }

    /// Number of update cycles the driver has run to completion.
    pub fn steps_driven(&self) -> u64 {
        self.steps_driven.load(Ordering::Acquire)
    }

    fn run_update_cycle(&self, callbacks: &dyn LifecycleCallbacks, step: SimTime) {
        // UPDATE_Y: ask the engine for outputs; its DONE ack means the
        // output port now holds them.
        callbacks.on_update_y();

        let outputs = self.output.lock().clone();
        let sim_time = {
            let mut t = self.sim_time.lock();
            *t += step;
            *t
        };
        let inputs = (self.transform)(&outputs, sim_time);
        trace!(
            node = %self.name,
            outputs = outputs.len(),
            inputs = inputs.len(),
            %sim_time,
            "update cycle"
        );
        self.input.replace(&inputs);

        // UPDATE_X: announce the new inputs and wait for the engine to
        // consume them.
        callbacks.on_update_x();

        self.steps_driven.fetch_add(1, Ordering::Release);
    }
}

impl CosimNode for LoopbackNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> Result<(), StartupError> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn run(&self, callbacks: Arc<dyn LifecycleCallbacks>) {
        callbacks.on_initialization();

        while let Ok(cmd) = self.cmd_rx.recv() {
            match cmd {
                LoopbackCommand::Advance { step } => {
                    self.run_update_cycle(callbacks.as_ref(), step);
                }
                LoopbackCommand::Terminate => {
                    callbacks.on_termination();
                    break;
                }
                LoopbackCommand::InjectError { kind, info } => {
                    callbacks.on_framework_error(kind, &info);
                }
                LoopbackCommand::Task(task) => task(),
            }
            if self.stopped.load(Ordering::Acquire) {
                break;
            }
        }
    }

    fn stop_simulation(&self) {
        self.stopped.store(true, Ordering::Release);
        // Wake the loop if it is blocked waiting for the next command.
        let _ = self.cmd_tx.send(LoopbackCommand::Task(Box::new(|| {})));
    }

    fn post_callback_event(&self, task: CallbackTask) {
        let _ = self.cmd_tx.send(LoopbackCommand::Task(task));
    }

    fn current_sim_time(&self) -> SimTime {
        *self.sim_time.lock()
    }

    fn output_port(&self) -> &ValuePort {
        &self.output
    }

    fn input_port(&self) -> &ValuePort {
        &self.input
    }
}

/// Test/demo stand-in for the co-simulation network.
///
/// Cheap to clone channel sender; commands queue up and the node's
/// execution loop consumes them in order.
pub struct LoopbackDriver {
    cmd_tx: Sender<LoopbackCommand>,
}

impl LoopbackDriver {
    /// Queue one update cycle advancing simulated time by `step`.
    ///
    /// Returns `false` if the node's execution loop has already exited.
    pub fn advance(&self, step: SimTime) -> bool {
        self.cmd_tx
            .send(LoopbackCommand::Advance { step })
            .is_ok()
    }

    /// Terminate the node's simulation normally.
    pub fn terminate(&self) {
        let _ = self.cmd_tx.send(LoopbackCommand::Terminate);
    }

    /// Make the node report a framework error.
    pub fn inject_error(&self, kind: FrameworkErrorKind, info: impl Into<String>) {
        let _ = self.cmd_tx.send(LoopbackCommand::InjectError {
            kind,
            info: info.into(),
        });
    }
}
