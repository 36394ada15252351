//! Session/profile store — a single-owner cache of the authenticated user's
//! profile with idempotent, single-flight revalidation and an event channel
//! for state-change subscribers.
//!
//! Concurrent `revalidate` calls share one upstream fetch: the first caller
//! through the flight lock performs it, later callers observe the bumped
//! generation and return the refreshed cache instead of re-fetching. State
//! lives in one place; no caller ever works from a captured stale snapshot.

pub mod handlers;
pub mod retry;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tracing::debug;

use crate::upstream::types::Profile;
use crate::upstream::{UpstreamClient, UpstreamError};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Where profiles come from. `UpstreamClient` in production; tests install
/// counting fakes.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, token: Option<&str>) -> Result<Option<Profile>, UpstreamError>;
}

#[async_trait]
impl ProfileSource for UpstreamClient {
    async fn fetch_profile(&self, token: Option<&str>) -> Result<Option<Profile>, UpstreamError> {
        UpstreamClient::fetch_profile(self, token).await
    }
}

/// Broadcast to subscribers whenever the cached profile changes.
#[derive(Debug, Clone)]
pub enum ProfileEvent {
    Updated(Profile),
    SignedOut,
}

struct CacheState {
    profile: Option<Profile>,
    /// Bumped on every cache write; lets a waiting revalidation detect that
    /// the flight leader already refreshed the cache.
    generation: u64,
}

pub struct SessionStore {
    source: Arc<dyn ProfileSource>,
    cache: Mutex<CacheState>,
    flight: AsyncMutex<()>,
    events: broadcast::Sender<ProfileEvent>,
}

impl SessionStore {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            cache: Mutex::new(CacheState {
                profile: None,
                generation: 0,
            }),
            flight: AsyncMutex::new(()),
            events,
        }
    }

    /// The cached profile, if any. Never blocks on the network.
    pub fn current(&self) -> Option<Profile> {
        self.cache.lock().expect("session cache poisoned").profile.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.events.subscribe()
    }

    /// Replaces the cached profile with a server-pushed one and notifies
    /// subscribers.
    pub fn apply(&self, profile: Profile) {
        {
            let mut cache = self.cache.lock().expect("session cache poisoned");
            cache.profile = Some(profile.clone());
            cache.generation += 1;
        }
        let _ = self.events.send(ProfileEvent::Updated(profile));
    }

    /// Clears the cached profile and notifies subscribers.
    pub fn sign_out(&self) {
        {
            let mut cache = self.cache.lock().expect("session cache poisoned");
            cache.profile = None;
            cache.generation += 1;
        }
        let _ = self.events.send(ProfileEvent::SignedOut);
    }

    /// Refreshes the cache from the profile source. Idempotent and
    /// single-flight: callers that arrive while a fetch is in flight wait on
    /// the flight lock and then reuse the leader's result. A `None` from the
    /// source means no authenticated user and clears the cache.
    pub async fn revalidate(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Profile>, UpstreamError> {
        let entry_generation = {
            self.cache
                .lock()
                .expect("session cache poisoned")
                .generation
        };

        let _flight = self.flight.lock().await;

        {
            let cache = self.cache.lock().expect("session cache poisoned");
            if cache.generation != entry_generation {
                debug!("revalidate coalesced with in-flight refresh");
                return Ok(cache.profile.clone());
            }
        }

        match self.source.fetch_profile(token).await? {
            Some(profile) => {
                self.apply(profile.clone());
                Ok(Some(profile))
            }
            None => {
                self.sign_out();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    fn profile(credits: i64) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            full_name: Some("Jane Doe".to_string()),
            avatar_url: None,
            credits,
            created_at: None,
        }
    }

    struct CountingSource {
        fetches: AtomicU32,
        profile: Option<Profile>,
    }

    #[async_trait]
    impl ProfileSource for CountingSource {
        async fn fetch_profile(
            &self,
            _token: Option<&str>,
        ) -> Result<Option<Profile>, UpstreamError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent revalidations pile up behind the flight lock.
            tokio::task::yield_now().await;
            Ok(self.profile.clone())
        }
    }

    fn store_with(profile: Option<Profile>) -> (Arc<SessionStore>, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            profile,
        });
        (
            Arc::new(SessionStore::new(source.clone())),
            source,
        )
    }

    #[tokio::test]
    async fn test_revalidate_populates_cache() {
        let (store, _) = store_with(Some(profile(3)));
        assert!(store.current().is_none());
        let refreshed = store.revalidate(None).await.unwrap();
        assert_eq!(refreshed.unwrap().credits, 3);
        assert_eq!(store.current().unwrap().credits, 3);
    }

    #[tokio::test]
    async fn test_revalidate_none_clears_cache() {
        let (store, _) = store_with(None);
        store.apply(profile(2));
        let refreshed = store.revalidate(None).await.unwrap();
        assert!(refreshed.is_none());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_revalidations_share_one_fetch() {
        let (store, source) = store_with(Some(profile(5)));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.revalidate(None).await.unwrap() })
            })
            .collect();
        for task in tasks {
            let refreshed = task.await.unwrap();
            assert_eq!(refreshed.unwrap().credits, 5);
        }
        // Followers coalesce onto the leader's fetch.
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_revalidations_fetch_again() {
        let (store, source) = store_with(Some(profile(5)));
        store.revalidate(None).await.unwrap();
        store.revalidate(None).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_apply_broadcasts_updated_event() {
        let (store, _) = store_with(None);
        let mut rx = store.subscribe();
        store.apply(profile(7));
        match rx.recv().await.unwrap() {
            ProfileEvent::Updated(p) => assert_eq!(p.credits, 7),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_out_broadcasts_and_clears() {
        let (store, _) = store_with(None);
        store.apply(profile(1));
        let mut rx = store.subscribe();
        store.sign_out();
        assert!(store.current().is_none());
        assert!(matches!(rx.recv().await.unwrap(), ProfileEvent::SignedOut));
    }
}
