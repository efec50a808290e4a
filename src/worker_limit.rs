use std::sync::{Arc, Condvar, Mutex};

/// Caps the number of connection threads running at once.
///
/// [`acquire`](WorkerLimit::acquire) blocks while `max` permits are
/// outstanding; each [`WorkerPermit`] frees its slot when dropped, which
/// happens when the connection thread that owns it finishes.
/// A limit of `None` never blocks.
#[derive(Clone, Debug)]
pub struct WorkerLimit {
    max: Option<usize>,
    state: Arc<(Mutex<usize>, Condvar)>,
}

/// A slot in a [`WorkerLimit`], released on drop.
#[derive(Debug)]
pub struct WorkerPermit {
    state: Arc<(Mutex<usize>, Condvar)>,
}

impl WorkerLimit {
    /// Creates a limit allowing at most `max` active permits.
    /// `Some(0)` is treated as `Some(1)`.
    pub fn new(max: Option<usize>) -> Self {
        Self {
            max: max.map(|m| m.max(1)),
            state: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }

    /// Waits for a free slot and claims it.
    pub fn acquire(&self) -> WorkerPermit {
        let (lock, cvar) = &*self.state;
        let mut active = lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(max) = self.max {
            while *active >= max {
                log::trace!("Worker limit {} reached, waiting for a free slot", max);
                active = cvar.wait(active).unwrap_or_else(|e| e.into_inner());
            }
        }
        *active += 1;
        WorkerPermit {
            state: self.state.clone(),
        }
    }

    /// Number of permits currently held.
    pub fn active(&self) -> usize {
        *self.state.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.state;
        let mut active = lock.lock().unwrap_or_else(|e| e.into_inner());
        *active = active.saturating_sub(1);
        cvar.notify_one();
    }
}
