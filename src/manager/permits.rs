//! Read permits
//!
//! Counting semaphore bounding the number of concurrent scans. A permit is
//! held by a guard and returned when the guard drops, on success, error or
//! unwind alike.

use parking_lot::{Condvar, Mutex};

pub struct Permits {
    available: Mutex<usize>,
    released: Condvar,
}

impl Permits {
    pub fn new(count: usize) -> Self {
        Self {
            available: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    /// Block until a permit is free and take it
    pub fn acquire(&self) -> PermitGuard<'_> {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
        PermitGuard { permits: self }
    }

    /// Take a permit only if one is free right now
    pub fn try_acquire(&self) -> Option<PermitGuard<'_>> {
        let mut available = self.available.lock();
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(PermitGuard { permits: self })
    }

    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    fn release(&self) {
        *self.available.lock() += 1;
        self.released.notify_one();
    }
}

/// One acquired permit
pub struct PermitGuard<'a> {
    permits: &'a Permits,
}

impl Drop for PermitGuard<'_> {
    fn drop(&mut self) {
        self.permits.release();
    }
}
