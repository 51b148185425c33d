//! Event backend the demo reads through the cache.
//!
//! Stands in for the REST client of the eventide web app: every call takes
//! a configurable amount of time and is counted, so the demo can show
//! which reads reached the backend.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A volunteer event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: u64,
    /// Title shown in listings
    pub title: String,
}

/// Errors returned by an [`EventBackend`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// No event with this ID.
    #[error("event {0} not found")]
    NotFound(u64),

    /// Backend did not answer.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Source of event data.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Lists all events.
    async fn list_events(&self) -> Result<Vec<Event>, BackendError>;

    /// Fetches one event.
    async fn get_event(&self, id: u64) -> Result<Event, BackendError>;

    /// Creates an event and returns it.
    async fn create_event(&self, title: &str) -> Result<Event, BackendError>;
}

/// In-memory backend with simulated latency.
#[derive(Debug)]
pub struct MemoryBackend {
    events: RwLock<Vec<Event>>,
    next_id: AtomicU64,
    latency: Duration,
    calls: AtomicUsize,
}

impl MemoryBackend {
    /// Creates a backend answering after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            latency,
            calls: AtomicUsize::new(0),
        }
    }

    /// Inserts an event without any latency, bypassing callers' caches.
    pub fn seed(&self, title: &str) -> Event {
        let event = Event {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: title.to_owned(),
        };
        self.events.write().push(event.clone());
        event
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        self.round_trip().await;
        Ok(self.events.read().clone())
    }

    async fn get_event(&self, id: u64) -> Result<Event, BackendError> {
        self.round_trip().await;
        self.events
            .read()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(BackendError::NotFound(id))
    }

    async fn create_event(&self, title: &str) -> Result<Event, BackendError> {
        self.round_trip().await;
        Ok(self.seed(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_memory_backend() {
        let backend = MemoryBackend::new(Duration::from_millis(10));
        backend.seed("Beach cleanup");

        let created = backend.create_event("Food drive").await.unwrap();
        assert_eq!(created.id, 2);

        let events = backend.list_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(backend.get_event(1).await.unwrap().title, "Beach cleanup");
        assert_eq!(backend.get_event(9).await, Err(BackendError::NotFound(9)));
        assert_eq!(backend.calls(), 4);
    }
}
