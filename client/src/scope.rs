//! View lifetime: liveness flag, owned timer tasks and guarded state slots.
//!
//! DESIGN
//! ======
//! A `ViewScope` is created when a panel mounts and closed when it unmounts.
//! It owns every timer task the panel spawned, so `close()` stops them all.
//! Requests that were already awaited by a caller cannot be recalled, so every
//! write into panel state goes through a `Slot`, which checks the scope's
//! `Liveness` first and silently drops writes after close.
//!
//! Dropping a scope closes it.

#[cfg(test)]
#[path = "scope_test.rs"]
mod scope_test;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// =============================================================================
// LIVENESS
// =============================================================================

/// Shared read-only view of a scope's open/closed flag.
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// =============================================================================
// VIEW SCOPE
// =============================================================================

#[derive(Debug)]
pub struct ViewScope {
    alive: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    #[must_use]
    pub fn new() -> Self {
        Self { alive: Arc::new(AtomicBool::new(true)), tasks: Mutex::new(Vec::new()) }
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        Liveness(Arc::clone(&self.alive))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Spawn a task owned by this scope. Ignored once the scope is closed.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.is_open() {
            return;
        }
        let handle = tokio::spawn(future);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Run `tick` immediately and then every `period` until the scope closes.
    ///
    /// Ticks run sequentially inside one task; a slow tick delays the next
    /// one rather than piling up.
    pub fn spawn_interval<F, Fut>(&self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let liveness = self.liveness();
        self.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !liveness.is_alive() {
                    break;
                }
                tick().await;
            }
        });
    }

    /// Clear the liveness flag and abort every owned task. Idempotent.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn task_count(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// SLOT
// =============================================================================

/// A single-writer, many-reader state cell bound to a scope's liveness.
pub struct Slot<T> {
    tx: Arc<watch::Sender<T>>,
    liveness: Liveness,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx), liveness: self.liveness.clone() }
    }
}

impl<T> Slot<T> {
    pub fn new(initial: T, liveness: Liveness) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx), liveness }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Mutate in place. `modify` returns whether it changed anything, which
    /// decides if subscribers are woken. Returns `false` after close.
    pub fn update<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        if !self.liveness.is_alive() {
            return false;
        }
        self.tx.send_if_modified(modify)
    }

    /// Read through a closure without cloning the whole value.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.tx.borrow())
    }
}

impl<T: Clone> Slot<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: PartialEq> Slot<T> {
    /// Replace the value, waking subscribers only when it differs.
    pub fn set(&self, value: T) -> bool {
        self.update(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}
