//! Authenticated HTTP plumbing shared by the providers.

use std::sync::Arc;

use reqwest::{header, Method};
use tracing::debug;

use crate::error::Result;

mod utils;

pub use self::utils::{check_status, read_body, ServerError};

/// Decorates outgoing requests with provider credentials.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &mut reqwest::Request) -> Result<()>;
}

#[async_trait::async_trait]
impl<A> Authenticator for Arc<A>
where
    A: Authenticator + ?Sized,
{
    async fn authenticate(&self, request: &mut reqwest::Request) -> Result<()> {
        (**self).authenticate(request).await
    }
}

/// Append url-encoded query parameters to `base`.
pub fn url_with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let query = serde_urlencoded::to_string(params)?;
    if query.is_empty() {
        return Ok(base.to_owned());
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    Ok(format!("{}{}{}", base, separator, query))
}

/// Sends requests after running them through an [`Authenticator`].
pub struct Client<A> {
    pub client: reqwest::Client,
    pub authenticator: A,
}

impl<A> Client<A>
where
    A: Authenticator,
{
    pub fn new(client: reqwest::Client, authenticator: A) -> Self {
        Self {
            client,
            authenticator,
        }
    }

    /// Build, authenticate and dispatch a request.
    ///
    /// Fails before touching the network when authentication fails. The
    /// response is returned as is, status checks are left to the caller.
    pub async fn send_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        content_type: &str,
    ) -> Result<reqwest::Response> {
        let builder = self
            .client
            .request(method.clone(), url)
            .header(header::CONTENT_TYPE, content_type);

        let builder = match body {
            Some(body) => builder.body(body),
            None if method == Method::POST => builder.header(header::CONTENT_LENGTH, 0),
            None => builder,
        };

        let mut request = builder.build()?;
        self.authenticator.authenticate(&mut request).await?;

        debug!(message = "Sending request", method = %method, url = %request.url().path());

        let res = self.client.execute(request).await?;
        Ok(res)
    }
}
