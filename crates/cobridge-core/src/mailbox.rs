//! Single-slot signal mailbox with blocking, timeout-capable waits.
//!
//! A mailbox holds exactly one signal value behind a mutex, paired with a
//! condvar. Writers overwrite whatever is in the slot (last-write-wins);
//! there is no queueing. The handshake protocol is strictly lockstep, so
//! at most one unread signal is ever in flight per direction — overwrite
//! is observationally equivalent to a depth-1 queue but cannot grow if a
//! buggy peer posts repeatedly before a read.
//!
//! The slot is reset to the empty sentinel only by the logical consumer
//! of the signal, after it has fully acted on the value. Resetting inside
//! `post` would lose the value if the post raced ahead of the reader.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A signal type with a distinguished empty-slot sentinel.
pub trait SignalValue: Copy + Eq + std::fmt::Debug + Send + 'static {
    /// The empty-slot sentinel. Never a real message.
    const NONE: Self;

    /// Whether this value is the empty sentinel.
    fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl SignalValue for cobridge_common::EngineSignal {
    const NONE: Self = cobridge_common::EngineSignal::None;
}

impl SignalValue for cobridge_common::NodeSignal {
    const NONE: Self = cobridge_common::NodeSignal::None;
}

/// Single-slot, overwrite-on-set, guarded signal holder.
///
/// `post` makes the written value visible to all waiters before any of
/// them wakes; the mutex provides the release/acquire pairing the value
/// ports rely on for their unlocked handoff.
#[derive(Debug)]
pub struct SignalMailbox<S> {
    slot: Mutex<S>,
    cond: Condvar,
}

impl<S: SignalValue> SignalMailbox<S> {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        SignalMailbox {
            slot: Mutex::new(S::NONE),
            cond: Condvar::new(),
        }
    }

    /// Store `value` in the slot and wake all waiters.
    ///
    /// Overwrites any unread prior value. Non-blocking, never fails.
    pub fn post(&self, value: S) {
        {
            let mut slot = self.slot.lock();
            *slot = value;
        }
        self.cond.notify_all();
    }

    /// Block until the slot holds a value satisfying `matches`, or until
    /// `timeout` elapses.
    ///
    /// A `timeout` of `None` waits indefinitely. Returns the satisfying
    /// value, or `None` on expiry. If a satisfying value is already
    /// present the call returns immediately without waiting.
    ///
    /// The slot is left untouched; the caller resets it (or not) once it
    /// has acted on the value.
    pub fn wait_matching(
        &self,
        matches: impl Fn(S) -> bool,
        timeout: Option<Duration>,
    ) -> Option<S> {
        let mut slot = self.slot.lock();
        if matches(*slot) {
            return Some(*slot);
        }

        match timeout {
            None => loop {
                self.cond.wait(&mut slot);
                if matches(*slot) {
                    return Some(*slot);
                }
            },
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    if self.cond.wait_until(&mut slot, deadline).timed_out() {
                        // A final check: the post may have landed right at
                        // the deadline.
                        return if matches(*slot) { Some(*slot) } else { None };
                    }
                    if matches(*slot) {
                        return Some(*slot);
                    }
                }
            }
        }
    }

    /// Block until the slot holds any non-empty signal, or until `timeout`
    /// elapses. See [`SignalMailbox::wait_matching`].
    pub fn wait_any(&self, timeout: Option<Duration>) -> Option<S> {
        self.wait_matching(|s| !s.is_none(), timeout)
    }

    /// Reset the slot to the empty sentinel.
    ///
    /// Idempotent: resetting an already-empty mailbox is a no-op and
    /// never blocks.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        *slot = S::NONE;
    }

    /// Read the slot and reset it under a single lock acquisition.
    ///
    /// Used where a concurrent post between a separate read and reset
    /// would lose a signal (the node thread's engine-signal task).
    pub fn take(&self) -> S {
        let mut slot = self.slot.lock();
        std::mem::replace(&mut *slot, S::NONE)
    }

    /// Reset the slot only if it still holds `expected`; returns whether
    /// it was cleared.
    ///
    /// Used where the consumer has already observed `expected` through a
    /// wait and must not erase a different signal posted in the interim
    /// (the node thread's ack handling).
    pub fn consume(&self, expected: S) -> bool {
        let mut slot = self.slot.lock();
        if *slot == expected {
            *slot = S::NONE;
            true
        } else {
            false
        }
    }

    /// Read the current slot value without waiting or resetting.
    pub fn peek(&self) -> S {
        *self.slot.lock()
    }
}

impl<S: SignalValue> Default for SignalMailbox<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use cobridge_common::NodeSignal;

    use super::*;

    #[test]
    fn test_wait_returns_immediately_when_value_present() {
        let mailbox = SignalMailbox::new();
        mailbox.post(NodeSignal::UpdateY);

        let sig = mailbox.wait_any(Some(Duration::from_millis(10)));
        assert_eq!(sig, Some(NodeSignal::UpdateY));
        // The value stays until the consumer resets it.
        assert_eq!(mailbox.peek(), NodeSignal::UpdateY);
    }

    #[test]
    fn test_overwrite_keeps_only_last_value() {
        let mailbox = SignalMailbox::new();
        mailbox.post(NodeSignal::Start);
        mailbox.post(NodeSignal::UpdateY);

        // Exactly one readable value: the second post.
        assert_eq!(
            mailbox.wait_any(Some(Duration::from_millis(10))),
            Some(NodeSignal::UpdateY)
        );
        mailbox.reset();
        assert_eq!(mailbox.wait_any(Some(Duration::from_millis(10))), None);
    }

    #[test]
    fn test_reset_is_idempotent_and_never_blocks() {
        let mailbox: SignalMailbox<NodeSignal> = SignalMailbox::new();
        mailbox.reset();
        mailbox.reset();
        assert_eq!(mailbox.peek(), NodeSignal::None);
    }

    #[test]
    fn test_take_reads_and_resets_atomically() {
        let mailbox = SignalMailbox::new();
        mailbox.post(NodeSignal::Terminate);
        assert_eq!(mailbox.take(), NodeSignal::Terminate);
        assert_eq!(mailbox.take(), NodeSignal::None);
    }

    #[test]
    fn test_consume_preserves_a_signal_posted_after_the_wait() {
        use cobridge_common::EngineSignal;

        let mailbox = SignalMailbox::new();
        mailbox.post(EngineSignal::Done);
        assert!(mailbox.consume(EngineSignal::Done));
        assert_eq!(mailbox.peek(), EngineSignal::None);

        // A shutdown request that overwrote the ack before the consumer
        // got around to clearing it must survive, so the engine-signal
        // task can still observe it.
        mailbox.post(EngineSignal::Done);
        mailbox.post(EngineSignal::Exit);
        assert!(!mailbox.consume(EngineSignal::Done));
        assert_eq!(mailbox.take(), EngineSignal::Exit);
    }

    #[test]
    fn test_wait_wakes_on_post_from_other_thread() {
        let mailbox = Arc::new(SignalMailbox::new());
        let poster = Arc::clone(&mailbox);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            poster.post(NodeSignal::UpdateX);
        });

        let sig = mailbox.wait_any(Some(Duration::from_secs(5)));
        assert_eq!(sig, Some(NodeSignal::UpdateX));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_matching_skips_non_matching_values() {
        let mailbox = Arc::new(SignalMailbox::new());
        mailbox.post(NodeSignal::Start);
        let poster = Arc::clone(&mailbox);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            poster.post(NodeSignal::UpdateY);
        });

        // Start does not match, so the wait continues until UpdateY lands.
        let sig = mailbox.wait_matching(|s| s == NodeSignal::UpdateY, Some(Duration::from_secs(5)));
        assert_eq!(sig, Some(NodeSignal::UpdateY));
        handle.join().unwrap();
    }

    #[test]
    fn test_timeout_expires_within_bounded_margin() {
        let mailbox: SignalMailbox<NodeSignal> = SignalMailbox::new();

        let start = Instant::now();
        let sig = mailbox.wait_any(Some(Duration::from_secs(1)));
        let elapsed = start.elapsed();

        assert_eq!(sig, None);
        assert!(elapsed >= Duration::from_millis(950), "woke early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "woke far too late: {elapsed:?}");
    }
}
