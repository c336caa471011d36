//! Ready-wait strategies
//!
//! The protocol polls the status register until the device reports ready.
//! There is no cap on the number of polls and no timeout: a device that
//! never becomes ready keeps the caller in the loop. A [`WaitStrategy`]
//! decides what counts as ready and what to do between polls, but it cannot
//! abort the loop.

use crate::status::Status;

/// Policy for the poll-until-ready loop
pub trait WaitStrategy {
    /// Whether `status` ends the loop
    fn is_ready(&self, status: Status) -> bool {
        status.is_ready()
    }

    /// Called after each not-ready read
    ///
    /// `polls` is the number of reads performed so far in this wait.
    fn backoff(&mut self, _polls: u32) {}
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &mut W {
    fn is_ready(&self, status: Status) -> bool {
        (**self).is_ready(status)
    }

    fn backoff(&mut self, polls: u32) {
        (**self).backoff(polls)
    }
}

/// Re-read immediately, with no delay between polls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyWait;

impl WaitStrategy for BusyWait {}

/// Run a caller-supplied hook between polls
///
/// Typical hooks sleep the thread or call a HAL delay:
///
/// ```ignore
/// let wait = Backoff::new(|_| std::thread::sleep(Duration::from_micros(10)));
/// ```
pub struct Backoff<F> {
    hook: F,
}

impl<F: FnMut(u32)> Backoff<F> {
    /// Create a backoff strategy around `hook`
    pub fn new(hook: F) -> Self {
        Self { hook }
    }
}

impl<F: FnMut(u32)> WaitStrategy for Backoff<F> {
    fn backoff(&mut self, polls: u32) {
        (self.hook)(polls)
    }
}

impl<F> core::fmt::Debug for Backoff<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backoff").finish_non_exhaustive()
    }
}
