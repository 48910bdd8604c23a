use pubkv_core::{Result, StoreTarget};
use pubkv_handler::HandlerFactory;
use pubkv_kvstore::{MemorySentinel, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Route test logs through tracing-subscriber at WARN level.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

/// Fresh in-memory store and a simple-mode factory over it
pub fn memory_factory() -> (MemoryStore, HandlerFactory) {
    let store = MemoryStore::default();
    let factory = HandlerFactory::new(Arc::new(store.clone()));
    (store, factory)
}

/// Fresh in-memory store registered as `group` behind a sentinel, and a
/// high-availability factory resolved through it
pub async fn sentinel_factory(group: &str) -> Result<(MemoryStore, HandlerFactory)> {
    let store = MemoryStore::default();
    let sentinel = Arc::new(MemorySentinel::new());
    sentinel.add_group(group, store.clone());

    let factory =
        HandlerFactory::connect(StoreTarget::HighAvailability(sentinel), Some(group)).await?;
    Ok((store, factory))
}

/// Poll `condition` until it holds or `within` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    condition()
}
