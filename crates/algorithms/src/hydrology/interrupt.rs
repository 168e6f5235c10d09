//! Cooperative cancellation for long-running traversals

use reliefill_core::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of frontier pops between two interrupt polls
pub(crate) const POLL_INTERVAL: usize = 1024;

/// Abort hook polled by fills while they run.
///
/// An interactive host keeps a clone of the flag and raises it to stop a
/// fill, or sets a deadline up front. The default never triggers.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// An interrupt that never fires
    pub fn never() -> Self {
        Self::default()
    }

    /// Fire when `flag` becomes true
    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Fire once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Fire at a fixed instant
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether the fill should stop now
    pub fn is_triggered(&self) -> bool {
        self.flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` once triggered
    pub(crate) fn check(&self, visited: usize) -> Result<()> {
        if self.is_triggered() {
            return Err(Error::Cancelled { visited });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_fires() {
        assert!(!Interrupt::never().is_triggered());
        assert!(Interrupt::never().check(10).is_ok());
    }

    #[test]
    fn test_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let interrupt = Interrupt::never().with_flag(Arc::clone(&flag));
        assert!(!interrupt.is_triggered());

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(
            interrupt.check(42),
            Err(Error::Cancelled { visited: 42 })
        ));
    }

    #[test]
    fn test_expired_deadline() {
        let interrupt = Interrupt::never().with_timeout(Duration::ZERO);
        assert!(interrupt.is_triggered());
    }
}
