//! Obtain access tokens from the token issuing endpoint.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use super::AccessToken;
use crate::{
    error::{DecodeError, Result},
    http::{check_status, read_body},
};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Long lived credentials exchanged for bearer tokens.
#[derive(Clone)]
pub enum Credentials {
    /// Cognitive Services key, sent as a header. The endpoint answers with
    /// the raw token.
    SubscriptionKey(String),
    /// Client credentials flow. The endpoint answers with a JSON envelope.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::SubscriptionKey(_) => f.write_str("SubscriptionKey(..)"),
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

pub struct TokenIssuer {
    pub client: reqwest::Client,
    pub auth_url: String,
    pub credentials: Credentials,
    pub scope: String,
    /// Lifetime assumed when the endpoint doesn't say.
    pub default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        client: reqwest::Client,
        credentials: Credentials,
        config: &crate::microsoft::Config,
    ) -> Self {
        Self {
            client,
            auth_url: config.auth_url.clone(),
            credentials,
            scope: config.scope.clone(),
            default_ttl: config.token_ttl,
        }
    }

    fn build_request(&self) -> Result<reqwest::Request> {
        let builder = self.client.post(&self.auth_url);

        let builder = match &self.credentials {
            Credentials::SubscriptionKey(key) => builder
                .header(SUBSCRIPTION_KEY_HEADER, key)
                .header(header::CONTENT_LENGTH, 0),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let params = &[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("scope", self.scope.as_str()),
                ];
                let params = serde_urlencoded::to_string(params)?;
                builder
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(params)
            }
        };

        Ok(builder.build()?)
    }

    /// Perform a single token request.
    pub async fn perform(&self) -> Result<AccessToken> {
        let req = self.build_request()?;
        let requested_at = Instant::now();

        let res = self.client.execute(req).await?;
        let (status, body) = read_body(res).await?;
        check_status(status, &body)?;

        let token = parse_token_response(&body, requested_at, self.default_ttl)?;
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    /// The requested access token.
    access_token: String,
    /// The amount of time that an access token is valid (in seconds).
    #[serde(default)]
    expires_in: Option<ExpiresIn>,
}

/// Some token endpoints send `expires_in` as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<u64, DecodeError> {
        match self {
            ExpiresIn::Seconds(secs) => Ok(*secs),
            ExpiresIn::Text(text) => text.trim().parse().map_err(|_| {
                DecodeError::Malformed(format!("expires_in is not a number: {:?}", text))
            }),
        }
    }
}

/// Turn a token endpoint response body into an [`AccessToken`].
///
/// Accepts either a JSON envelope or the raw token string.
pub fn parse_token_response(
    body: &str,
    requested_at: Instant,
    default_ttl: Duration,
) -> Result<AccessToken, DecodeError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(DecodeError::Malformed("empty token response".into()));
    }

    if !body.starts_with('{') {
        return usable_token(body.to_owned(), requested_at, default_ttl);
    }

    let AuthResponse {
        access_token,
        expires_in,
    } = serde_json::from_str(body)?;

    if access_token.is_empty() {
        return Err(DecodeError::Malformed("empty access_token".into()));
    }

    let ttl = match expires_in {
        Some(expires_in) => Duration::from_secs(expires_in.seconds()?),
        None => default_ttl,
    };

    usable_token(access_token, requested_at, ttl)
}

/// A token must fit in an `Authorization` header and expire at a
/// representable instant. Anything else is rejected here so it never
/// reaches the cache.
fn usable_token(
    token: String,
    requested_at: Instant,
    ttl: Duration,
) -> Result<AccessToken, DecodeError> {
    if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
        return Err(DecodeError::Malformed(
            "access token is not a valid header value".into(),
        ));
    }
    let expires_at = requested_at
        .checked_add(ttl)
        .ok_or_else(|| DecodeError::Malformed("token lifetime out of range".into()))?;
    Ok(AccessToken::new(token, expires_at))
}

#[async_trait::async_trait]
impl super::TokenRefresher for TokenIssuer {
    async fn refresh(&self, current: Option<&AccessToken>) -> Result<AccessToken> {
        debug!(
            message = "Requesting access token",
            auth_url = %self.auth_url,
            replacing_stale_token = current.is_some(),
        );
        self.perform().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(480);

    #[test]
    fn raw_token() {
        let now = Instant::now();
        let token = parse_token_response("eyJhbGciOi\n", now, TTL).unwrap();
        assert_eq!(token, AccessToken::new("eyJhbGciOi", now + TTL));
    }

    #[test]
    fn envelope_with_numeric_expiry() {
        let now = Instant::now();
        let body = r#"{"access_token":"T1","token_type":"bearer","scope":"s","expires_in":100}"#;
        let token = parse_token_response(body, now, TTL).unwrap();
        assert_eq!(token, AccessToken::new("T1", now + Duration::from_secs(100)));
    }

    #[test]
    fn envelope_with_string_expiry() {
        let now = Instant::now();
        let body = r#"{"access_token":"T1","expires_in":"600"}"#;
        let token = parse_token_response(body, now, TTL).unwrap();
        assert_eq!(token.expires_at, now + Duration::from_secs(600));
    }

    #[test]
    fn envelope_without_expiry_uses_default() {
        let now = Instant::now();
        let token = parse_token_response(r#"{"access_token":"T1"}"#, now, TTL).unwrap();
        assert_eq!(token.expires_at, now + TTL);
    }

    #[test]
    fn malformed_bodies() {
        let now = Instant::now();
        for body in [
            "",
            "   ",
            "{",
            r#"{"token_type":"bearer"}"#,
            r#"{"access_token":""}"#,
            r#"{"access_token":"T1","expires_in":"soon"}"#,
            r#"{"access_token":"T1","expires_in":18446744073709551615}"#,
            r#"{"access_token":"T1","expires_in":"18446744073709551615"}"#,
            "abc\ndef",
            "abc\u{7f}def",
            r#"{"access_token":"abc\ndef","expires_in":100}"#,
        ] {
            assert!(
                parse_token_response(body, now, TTL).is_err(),
                "accepted {:?}",
                body
            );
        }
    }

    #[test]
    fn huge_default_ttl_is_rejected() {
        let err = parse_token_response("raw-token", Instant::now(), Duration::MAX).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn debug_hides_secrets() {
        let key = Credentials::SubscriptionKey("hunter2".into());
        assert!(!format!("{:?}", key).contains("hunter2"));

        let creds = Credentials::ClientCredentials {
            client_id: "app".into(),
            client_secret: "hunter2".into(),
        };
        let text = format!("{:?}", creds);
        assert!(text.contains("app"));
        assert!(!text.contains("hunter2"));
    }
}
