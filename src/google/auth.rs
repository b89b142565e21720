use crate::{error::Result, http::Authenticator};

/// Authenticates by appending the API key to the query string.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    api_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &mut reqwest::Request) -> Result<()> {
        request
            .url_mut()
            .query_pairs_mut()
            .append_pair("key", &self.api_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_key_to_query() {
        let client = reqwest::Client::new();
        let mut request = client
            .get("https://example.com/language/translate/v2?q=Hello&target=de")
            .build()
            .unwrap();

        ApiKeyAuthenticator::new("my-secret-key")
            .authenticate(&mut request)
            .await
            .unwrap();

        assert_eq!(
            request.url().query(),
            Some("q=Hello&target=de&key=my-secret-key")
        );
    }

    #[tokio::test]
    async fn adds_query_when_missing() {
        let client = reqwest::Client::new();
        let mut request = client.get("https://example.com/languages").build().unwrap();

        ApiKeyAuthenticator::new("k").authenticate(&mut request).await.unwrap();

        assert_eq!(request.url().query(), Some("key=k"));
    }
}
