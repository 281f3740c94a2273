//! Token Cache
//!
//! Owns the current access token and serializes refreshes.
//!
//! At most one refresh is in flight at any time. Callers that find no valid token join the
//! in-flight refresh (a [`Shared`] future) instead of starting their own, so N concurrent
//! callers produce exactly one call to the authentication server and all observe the same
//! token or the same error.
//!
//! The refresh future itself stores its outcome and clears the in-flight slot. A caller that
//! is cancelled or times out while waiting therefore never leaves the cache half-updated; the
//! next caller simply resumes the same refresh.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info_span, warn, Instrument};

use crate::auth::Authenticator;
use crate::error::TrueLayerResult;
use crate::types::AccessToken;

/// Default margin kept before the token's expiry.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

type SharedRefresh = Shared<BoxFuture<'static, TrueLayerResult<AccessToken>>>;

#[derive(Default)]
struct Slot {
    token: Option<AccessToken>,
    refresh: Option<(u64, SharedRefresh)>,
    generation: u64,
}

/// Token Cache with single-flight refresh.
pub struct TokenCache {
    authenticator: Arc<dyn Authenticator>,
    safety_margin: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl TokenCache {
    /// Create a cache using [`DEFAULT_SAFETY_MARGIN`].
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self::with_safety_margin(authenticator, DEFAULT_SAFETY_MARGIN)
    }

    /// Create a cache that treats tokens as expired `safety_margin` early.
    pub fn with_safety_margin(authenticator: Arc<dyn Authenticator>, safety_margin: Duration) -> Self {
        Self {
            authenticator,
            safety_margin,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Safety margin in use.
    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// Get a valid token, refreshing if the cached one is missing or about to expire.
    pub async fn get_valid_token(&self) -> TrueLayerResult<AccessToken> {
        let refresh = {
            let mut slot = lock(&self.slot);
            if let Some(token) = slot
                .token
                .as_ref()
                .filter(|token| token.is_valid_at(Utc::now(), self.safety_margin))
            {
                return Ok(token.clone());
            }

            match &slot.refresh {
                Some((_, in_flight)) => in_flight.clone(),
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let refresh = self.start_refresh(generation);
                    slot.refresh = Some((generation, refresh.clone()));
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Drop `token` from the cache if it is still the cached one.
    ///
    /// Used after the API rejected `token`; a newer token cached meanwhile is kept.
    pub fn invalidate(&self, token: &AccessToken) {
        let mut slot = lock(&self.slot);
        if slot.token.as_ref() == Some(token) {
            debug!("invalidating cached access token");
            slot.token = None;
        }
    }

    /// Cached token, without validity check or refresh.
    pub fn cached_token(&self) -> Option<AccessToken> {
        lock(&self.slot).token.clone()
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.slot).refresh.is_some()
    }

    fn start_refresh(&self, generation: u64) -> SharedRefresh {
        let authenticator = Arc::clone(&self.authenticator);
        // Weak so an abandoned refresh does not keep the cache alive.
        let slot = Arc::downgrade(&self.slot);

        async move {
            debug!("refreshing access token");
            let result = authenticator.authenticate().await;

            if let Some(slot) = slot.upgrade() {
                let mut slot = lock(&slot);
                if matches!(slot.refresh, Some((current, _)) if current == generation) {
                    slot.refresh = None;
                }
                match &result {
                    Ok(token) => {
                        debug!(expires_at = %token.expires_at, "access token cached");
                        slot.token = Some(token.clone());
                    }
                    Err(error) => warn!(error = %error, "access token refresh failed"),
                }
            }

            result
        }
        .instrument(info_span!("truelayer.token_refresh", generation))
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = lock(&self.slot);
        f.debug_struct("TokenCache")
            .field("safety_margin", &self.safety_margin)
            .field("token", &slot.token)
            .field("refreshing", &slot.refresh.is_some())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
