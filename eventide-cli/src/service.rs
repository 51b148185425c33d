//! Cached data access for events.

use std::sync::Arc;

use tracing::info;

use eventide_cache::{CacheManager, CacheRead};

use crate::backend::{BackendError, Event, EventBackend};

/// Key for the full event list.
pub const EVENTS_KEY: &str = "events:all";

/// Key for a single event.
pub fn event_key(id: u64) -> String {
    format!("event:{id}")
}

/// Reads events through the shared cache and invalidates it on writes.
#[derive(Clone)]
pub struct EventService {
    backend: Arc<dyn EventBackend>,
    cache: CacheManager,
}

impl EventService {
    /// Creates a service over `backend` using the shared `cache`.
    pub fn new(backend: Arc<dyn EventBackend>, cache: CacheManager) -> Self {
        Self { backend, cache }
    }

    /// Lists events.
    pub async fn list_events(&self) -> Result<CacheRead<Vec<Event>>, BackendError> {
        let backend = Arc::clone(&self.backend);
        self.cache
            .read(EVENTS_KEY, move || async move { backend.list_events().await })
            .await
    }

    /// Fetches one event.
    pub async fn get_event(&self, id: u64) -> Result<CacheRead<Event>, BackendError> {
        let backend = Arc::clone(&self.backend);
        self.cache
            .read(&event_key(id), move || async move { backend.get_event(id).await })
            .await
    }

    /// Creates an event. List and detail caches are dropped afterwards.
    pub async fn create_event(&self, title: &str) -> Result<Event, BackendError> {
        let event = self.backend.create_event(title).await?;
        let removed = self.cache.invalidate_pattern("events") + self.cache.invalidate_pattern("event:");
        info!(id = event.id, removed, "event created, caches invalidated");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eventide_cache::{CacheConfig, Freshness};

    use super::*;
    use crate::backend::MemoryBackend;

    fn setup() -> (Arc<MemoryBackend>, EventService) {
        let backend = Arc::new(MemoryBackend::new(Duration::from_millis(10)));
        let cache = CacheManager::new(CacheConfig::application()).unwrap();
        let service = EventService::new(backend.clone(), cache);
        (backend, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_is_cached() {
        let (backend, service) = setup();
        backend.seed("Park restoration");

        let first = service.list_events().await.unwrap();
        assert_eq!(first.freshness, Freshness::Fetched);
        let second = service.list_events().await.unwrap();
        assert_eq!(second.freshness, Freshness::Fresh);
        assert_eq!(second.value.len(), 1);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_invalidates_list_and_details() {
        let (backend, service) = setup();
        let seeded = backend.seed("Park restoration");

        tokio_test::assert_ok!(service.list_events().await);
        tokio_test::assert_ok!(service.get_event(seeded.id).await);
        tokio_test::assert_ok!(service.create_event("Blood drive").await);

        let list = service.list_events().await.unwrap();
        assert_eq!(list.freshness, Freshness::Fetched);
        assert_eq!(list.value.len(), 2);

        let detail = service.get_event(seeded.id).await.unwrap();
        assert_eq!(detail.freshness, Freshness::Fetched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_cached() {
        let (backend, service) = setup();

        let err = service.get_event(42).await.unwrap_err();
        assert_eq!(err, BackendError::NotFound(42));
        tokio_test::assert_err!(service.get_event(42).await);
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn test_event_key() {
        assert_eq!(event_key(7), "event:7");
    }
}
