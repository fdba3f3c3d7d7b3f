//! Flag/return-code surface over [`Session::exchange`].
//!
//! The embedding engine talks to external interfaces through a C-style
//! contract: preallocated buffers, an out-flag describing how the peer
//! ended the step, and an integer status. This module translates the
//! session API into that vocabulary so the engine's existing call sites
//! need no new types.

use cobridge_common::ExchangeError;

use crate::session::{ExchangeReply, Session};

/// Step flag: the step completed normally.
pub const FLAG_NORMAL: i32 = 0;
/// Step flag: the node's simulation terminated normally.
pub const FLAG_TERMINATED: i32 = 1;
/// Step flag: the node aborted the session.
pub const FLAG_ABORTED: i32 = -1;

/// Status: success.
pub const STATUS_OK: i32 = 0;
/// Status: no node session exists.
pub const STATUS_NO_NODE: i32 = -1;
/// Status: the node's inputs exceed the engine's read buffer.
pub const STATUS_CAPACITY: i32 = -11;
/// Status: a wait expired without the expected signal.
pub const STATUS_TIMEOUT: i32 = -21;
/// Status: an unexpected signal arrived at a handshake wait point.
pub const STATUS_UNEXPECTED_SIGNAL: i32 = -22;

/// Exchange one step of double values with the node.
///
/// Writes the node's inputs into the preallocated `inputs` buffer and
/// the step metadata into the out-parameters. `flag` is always written;
/// `input_count` and `sim_time` are written only when the step actually
/// completed. Returns [`STATUS_OK`] for completed steps *and* for
/// normal/abnormal termination (the flag tells them apart), a negative
/// status otherwise.
pub fn exchange_doubles(
    session: &Session,
    outputs: &[f64],
    flag: &mut i32,
    input_count: &mut usize,
    inputs: &mut [f64],
    sim_time: &mut f64,
) -> i32 {
    *flag = FLAG_NORMAL;
    *input_count = 0;

    match session.exchange(outputs) {
        Ok(ExchangeReply::Step { values, sim_time: t }) => {
            if values.len() > inputs.len() {
                return STATUS_CAPACITY;
            }
            inputs[..values.len()].copy_from_slice(&values);
            *input_count = values.len();
            *sim_time = t.as_secs_f64();
            STATUS_OK
        }
        Ok(ExchangeReply::Terminated) => {
            *flag = FLAG_TERMINATED;
            STATUS_OK
        }
        Ok(ExchangeReply::Aborted) => {
            *flag = FLAG_ABORTED;
            STATUS_OK
        }
        Err(ExchangeError::NoNode) => STATUS_NO_NODE,
        Err(ExchangeError::CapacityExceeded { .. }) => STATUS_CAPACITY,
        Err(ExchangeError::Timeout) => STATUS_TIMEOUT,
        Err(ExchangeError::UnexpectedSignal(_)) => STATUS_UNEXPECTED_SIGNAL,
    }
}
