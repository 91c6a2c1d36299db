// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle owner that bound sessions follow

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Observer = Box<dyn FnOnce() + Send + 'static>;

/// Observer plus the key it was registered under, if any
type Entry = (Option<usize>, Observer);

struct Inner {
    name: String,
    destroyed: AtomicBool,
    observers: Mutex<Vec<Entry>>,
}

impl Inner {
    fn lock_observers(&self) -> MutexGuard<'_, Vec<Entry>> {
        match self.observers.lock() {
            Ok(observers) => observers,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn take_observers(&self) -> Vec<Observer> {
        std::mem::take(&mut *self.lock_observers())
            .into_iter()
            .map(|(_, observer)| observer)
            .collect()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            debug!(owner = %self.name, "Lifecycle dropped");
            for observer in self.take_observers() {
                observer();
            }
        }
    }
}

/// Lifetime of the screen a camera session belongs to
///
/// Cloning shares the same lifetime. It ends on [`Lifecycle::destroy`] or
/// when the last handle is dropped, and observers run exactly once.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Lifecycle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                destroyed: AtomicBool::new(false),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Run `observer` when the lifecycle ends
    ///
    /// Runs immediately if it already has.
    pub fn on_destroy<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.register(None, Box::new(observer));
    }

    /// Like [`Lifecycle::on_destroy`], replacing any observer already
    /// registered under `key`
    pub fn on_destroy_keyed<F>(&self, key: usize, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.register(Some(key), Box::new(observer));
    }

    fn register(&self, key: Option<usize>, observer: Observer) {
        {
            let mut observers = self.inner.lock_observers();
            if !self.is_destroyed() {
                if key.is_some() {
                    observers.retain(|(k, _)| *k != key);
                }
                observers.push((key, observer));
                return;
            }
        }
        observer();
    }

    /// Observers waiting for the lifecycle to end
    pub fn observer_count(&self) -> usize {
        self.inner.lock_observers().len()
    }

    /// End the lifecycle now
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(owner = %self.inner.name, "Lifecycle destroyed");
        for observer in self.inner.take_observers() {
            observer();
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("name", &self.inner.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
