//! Scoped termination for controller handles.

use std::ops::{Deref, DerefMut};

use quarry_core::HandleLifecycle;

/// Borrows a handle for the length of a run and terminates it exactly once
/// when dropped: on game over, on the tick ceiling, on an early `?` return,
/// and while unwinding from a panic.
pub struct TerminateGuard<'h, H: HandleLifecycle + ?Sized> {
    handle: &'h mut H,
}

impl<'h, H: HandleLifecycle + ?Sized> TerminateGuard<'h, H> {
    /// Take responsibility for terminating `handle`.
    pub fn new(handle: &'h mut H) -> Self {
        Self { handle }
    }
}

impl<H: HandleLifecycle + ?Sized> Deref for TerminateGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.handle
    }
}

impl<H: HandleLifecycle + ?Sized> DerefMut for TerminateGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.handle
    }
}

impl<H: HandleLifecycle + ?Sized> Drop for TerminateGuard<'_, H> {
    fn drop(&mut self) {
        self.handle.terminate();
    }
}
