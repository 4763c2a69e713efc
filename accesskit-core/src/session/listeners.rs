use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

/// Fan-out list of callbacks for one event type.
pub(crate) struct Listeners<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Listeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.push((id, Arc::new(callback)));
            id
        };

        let registry: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).callbacks.retain(|(other, _)| *other != id);
            }
        })
    }

    /// Calls every subscriber in subscription order.
    ///
    /// The registry lock is released first, so a callback may unsubscribe itself
    /// or others; such changes apply from the next emission.
    pub(crate) fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = lock(&self.registry)
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Handle to a registered listener.
///
/// The listener stays registered until [`Subscription::unsubscribe`] is called or
/// the handle is dropped.
#[must_use = "dropping a subscription unsubscribes the listener"]
#[derive(uniffi::Object)]
pub struct Subscription {
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }
}

#[uniffi::export]
impl Subscription {
    /// Removes the listener. Further calls do nothing.
    pub fn unsubscribe(&self) {
        let unsubscribe = lock(&self.unsubscribe).take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &lock(&self.unsubscribe).is_some())
            .finish()
    }
}
