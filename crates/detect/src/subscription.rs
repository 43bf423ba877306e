//! Scoped OS subscriptions.

use std::sync::Arc;

/// Handler for notifications from an OS event source.
pub type EventHandler<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

pub fn new_handler<T, F>(f: F) -> EventHandler<T>
where
    F: Fn(T) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Guard for a registered OS observer. The observer is removed when the
/// guard is released or dropped, whichever comes first.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription that owns nothing.
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
