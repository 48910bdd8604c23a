use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Collects every value passed to a subscription callback.
pub struct CallbackRecorder<T> {
    values: Arc<Mutex<Vec<T>>>,
    notify: Arc<Notify>,
}

impl<T: Clone + Send + 'static> CallbackRecorder<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Callback that appends to this recorder
    pub fn callback(&self) -> impl Fn(T) + Send + Sync + 'static {
        let values = Arc::clone(&self.values);
        let notify = Arc::clone(&self.notify);
        move |value| {
            values.lock().push(value);
            notify.notify_waiters();
        }
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` values were recorded.
    ///
    /// Returns false if `within` elapses first.
    pub async fn wait_for(&self, count: usize, within: Duration) -> bool {
        let deadline = Instant::now() + within;
        loop {
            let notified = self.notify.notified();
            if self.len() >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.len() >= count;
            }
        }
    }
}

impl<T: Clone + Send + 'static> Default for CallbackRecorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CallbackRecorder<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            notify: Arc::clone(&self.notify),
        }
    }
}
