use reqwest::header::{HeaderValue, AUTHORIZATION};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AccessToken, TokenRefresher};
use crate::{
    error::{DecodeError, Result},
    http::Authenticator,
};

/// Caches one access token and refreshes it on demand.
///
/// Checking the cached token and refreshing it happen under a single lock, so
/// any number of concurrent callers finding the token missing or expired
/// cause exactly one refresh. The others wait and then reuse its result. A
/// failed refresh leaves the slot empty and the next caller tries again.
pub struct TokenManager<Refresher> {
    refresher: Refresher,
    cached_token: Mutex<Option<AccessToken>>,
}

impl<Refresher> TokenManager<Refresher>
where
    Refresher: TokenRefresher,
{
    pub fn new(refresher: Refresher) -> Self {
        Self::with_token(refresher, None)
    }

    /// Start from a known token instead of an empty slot.
    pub fn with_token(refresher: Refresher, token: Option<AccessToken>) -> Self {
        Self {
            refresher,
            cached_token: Mutex::const_new(token),
        }
    }

    pub fn refresher(&self) -> &Refresher {
        &self.refresher
    }

    pub async fn get_token(&self) -> Result<AccessToken> {
        let mut cached_token = self.cached_token.lock().await;

        if let Some(token) = &*cached_token {
            if !token.is_expired() {
                debug!(message = "Using preexisting token", token_expires_at = ?token.expires_at);
                return Ok(token.clone());
            }
            debug!(message = "Existing token expired, refreshing", token_expires_at = ?token.expires_at);
        }

        info!(
            message = "No active token found, about to get a new one",
            token_is_stale = cached_token.is_some(),
        );

        // Take the old token out first so the slot stays empty if refreshing fails.
        let stale = cached_token.take();
        let new_token = match self.refresher.refresh(stale.as_ref()).await {
            Ok(token) => token,
            Err(err) => {
                warn!(message = "Token refresh failed", error = %err);
                return Err(err);
            }
        };
        cached_token.replace(new_token.clone());

        debug!(message = "Got new token", token_expires_at = ?new_token.expires_at);

        Ok(new_token)
    }

    /// The `Authorization` header value, refreshing the token if needed.
    pub async fn auth_token(&self) -> Result<String> {
        let token = self.get_token().await?;
        Ok(token.bearer())
    }

    /// Snapshot of the cached token, without refreshing.
    pub async fn cached(&self) -> Option<AccessToken> {
        self.cached_token.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl<Refresher> Authenticator for TokenManager<Refresher>
where
    Refresher: TokenRefresher,
{
    async fn authenticate(&self, request: &mut reqwest::Request) -> Result<()> {
        let auth_token = self.auth_token().await?;
        let mut value = HeaderValue::from_str(&auth_token).map_err(|_| {
            DecodeError::Malformed("access token is not a valid header value".into())
        })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
