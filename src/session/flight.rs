//! RAII guards over the controller's busy flags

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a busy flag raised until dropped.
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use chatrpc::session::flight::FlightGuard;
///
/// let sending = AtomicBool::new(false);
/// let first = FlightGuard::try_acquire(&sending).unwrap();
/// assert!(FlightGuard::try_acquire(&sending).is_none());
/// drop(first);
/// assert!(FlightGuard::try_acquire(&sending).is_some());
/// ```
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    /// Raise `flag` if it is down. `None` means another holder has it.
    pub fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }

    /// Raise `flag` unconditionally, for indicators that are not single-flight.
    pub fn mark(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self { flag }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
