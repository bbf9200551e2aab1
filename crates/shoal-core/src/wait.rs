//! Cooperative, cancellable waits.
//!
//! Nothing here blocks. A [`Delay`] is polled from the frame loop and
//! settles once its deadline passes or its [`CancelToken`] is tripped.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }

    /// Read and clear the flag.
    pub fn take(&self) -> bool {
        self.flag.replace(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// A deadline that can be cut short through a [`CancelToken`].
#[derive(Debug, Clone)]
pub struct Delay {
    deadline: Instant,
    token: CancelToken,
}

impl Delay {
    pub fn new(now: Instant, duration: Duration, token: CancelToken) -> Self {
        Self {
            deadline: now + duration,
            token,
        }
    }

    /// Cancellation wins over an elapsed deadline observed in the same poll.
    pub fn poll(&self, now: Instant) -> Option<WaitOutcome> {
        if self.token.is_cancelled() {
            Some(WaitOutcome::Cancelled)
        } else if now >= self.deadline {
            Some(WaitOutcome::Elapsed)
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_elapses_at_deadline() {
        let now = Instant::now();
        let delay = Delay::new(now, Duration::from_millis(500), CancelToken::new());
        assert_eq!(delay.poll(now), None);
        assert_eq!(delay.poll(now + Duration::from_millis(499)), None);
        assert_eq!(
            delay.poll(now + Duration::from_millis(500)),
            Some(WaitOutcome::Elapsed)
        );
    }

    #[test]
    fn cancel_cuts_delay_short() {
        let now = Instant::now();
        let token = CancelToken::new();
        let delay = Delay::new(now, Duration::from_secs(10), token.clone());
        token.cancel();
        assert_eq!(delay.poll(now), Some(WaitOutcome::Cancelled));
        assert_eq!(
            delay.poll(now + Duration::from_secs(11)),
            Some(WaitOutcome::Cancelled)
        );
    }

    #[test]
    fn take_clears_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        assert!(token.take());
        assert!(!token.take());
        assert!(!other.is_cancelled());
    }
}
