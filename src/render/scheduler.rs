//! Tick scheduling: handles the host hands back on each display tick.

/// Identifies one requested tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host-side source of display ticks
pub trait TickScheduler {
    /// Ask for one more tick
    fn request_tick(&mut self) -> TickHandle;

    /// Withdraw a requested tick; it must never be delivered afterwards
    fn cancel_tick(&mut self, handle: TickHandle);
}

/// Scheduler driven by hand, for tests and headless recording
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<TickHandle>,
    cancelled: Vec<TickHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest requested tick that has not been cancelled
    pub fn take_pending(&mut self) -> Option<TickHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cancelled(&self) -> &[TickHandle] {
        &self.cancelled
    }
}

impl TickScheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        self.pending.retain(|&pending| pending != handle);
        self.cancelled.push(handle);
    }
}

/// Scheduler that wakes the host through a callback, e.g. a window redraw
pub struct CallbackScheduler<F: FnMut()> {
    next_id: u64,
    pending: Option<TickHandle>,
    wake: F,
}

impl<F: FnMut()> CallbackScheduler<F> {
    pub fn new(wake: F) -> Self {
        Self {
            next_id: 0,
            pending: None,
            wake,
        }
    }

    /// The tick to deliver now, if one is outstanding
    pub fn take_pending(&mut self) -> Option<TickHandle> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<F: FnMut()> TickScheduler for CallbackScheduler<F> {
    fn request_tick(&mut self) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some(handle);
        (self.wake)();
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_handles_are_unique() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_tick();
        let b = scheduler.request_tick();
        assert_ne!(a, b);
        assert_eq!(scheduler.take_pending(), Some(a));
        assert_eq!(scheduler.take_pending(), Some(b));
        assert_eq!(scheduler.take_pending(), None);
    }

    #[test]
    fn test_manual_cancel_removes_pending() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.request_tick();
        scheduler.cancel_tick(handle);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.cancelled(), &[handle]);
    }

    #[test]
    fn test_callback_wakes_on_request() {
        let mut wakes = 0;
        {
            let mut scheduler = CallbackScheduler::new(|| wakes += 1);
            let handle = scheduler.request_tick();
            assert!(scheduler.has_pending());
            scheduler.cancel_tick(handle);
            assert!(scheduler.take_pending().is_none());
            scheduler.request_tick();
        }
        assert_eq!(wakes, 2);
    }
}
