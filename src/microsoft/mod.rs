//! Microsoft Translator provider implementation.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use self::auth::{Credentials, TokenIssuer, TokenManager};
use crate::{
    core::{Language, LanguageCode, LanguageCodeRef},
    error::{ApiError, DecodeError, Error, Result},
    http::{self, check_status, read_body, url_with_query, Authenticator},
};

pub mod auth;
mod languages;

const SERVICE_URL: &str = "https://api.cognitive.microsofttranslator.com";
const LEGACY_SERVICE_URL: &str = "https://api.microsofttranslator.com";
const AUTH_URL: &str = "https://api.cognitive.microsoft.com/sts/v1.0/issueToken";

/// Endpoints and tunables for the Microsoft backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub auth_url: String,
    pub translation_url: String,
    pub detect_url: String,
    pub language_codes_url: String,
    pub language_names_url: String,
    pub api_version: String,
    /// Sent with the client credentials flow.
    pub scope: String,
    /// Locale the language names are reported in.
    pub locale: String,
    /// `plain` or `html`.
    pub text_type: String,
    /// Lifetime assumed for tokens issued without an explicit expiry. Issued
    /// tokens live for ten minutes, refreshing after eight leaves slack.
    pub token_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self::rooted_at(SERVICE_URL);
        config.auth_url = AUTH_URL.to_owned();
        config.language_codes_url =
            format!("{}/v2/Http.svc/GetLanguagesForTranslate", LEGACY_SERVICE_URL);
        config.language_names_url = format!("{}/v2/Http.svc/GetLanguageNames", LEGACY_SERVICE_URL);
        config
    }
}

impl Config {
    /// Point every endpoint at `base`, keeping the service's paths.
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/sts/v1.0/issueToken", base),
            translation_url: format!("{}/translate", base),
            detect_url: format!("{}/detect", base),
            language_codes_url: format!("{}/v2/Http.svc/GetLanguagesForTranslate", base),
            language_names_url: format!("{}/v2/Http.svc/GetLanguageNames", base),
            api_version: "3.0".to_owned(),
            scope: "http://api.microsofttranslator.com".to_owned(),
            locale: "en".to_owned(),
            text_type: "html".to_owned(),
            token_ttl: Duration::from_secs(8 * 60),
        }
    }
}

pub struct Provider<Auth = TokenManager<TokenIssuer>> {
    http: http::Client<Auth>,
    config: Config,
    languages: OnceCell<Vec<Language>>,
}

impl Provider {
    /// Provider authenticating with bearer tokens obtained from `credentials`.
    pub fn new(client: reqwest::Client, credentials: Credentials, config: Config) -> Self {
        let issuer = TokenIssuer::new(client.clone(), credentials, &config);
        Self::with_authenticator(client, TokenManager::new(issuer), config)
    }
}

impl<Auth> Provider<Auth>
where
    Auth: Authenticator,
{
    pub fn with_authenticator(client: reqwest::Client, authenticator: Auth, config: Config) -> Self {
        Self {
            http: http::Client::new(client, authenticator),
            config,
            languages: OnceCell::new(),
        }
    }

    pub fn authenticator(&self) -> &Auth {
        &self.http.authenticator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn request_translation(
        &self,
        text: &str,
        from: &LanguageCodeRef,
        to: &LanguageCodeRef,
    ) -> Result<String> {
        let url = url_with_query(
            &self.config.translation_url,
            &[
                ("api-version", self.config.api_version.as_str()),
                ("from", from),
                ("to", to),
                ("textType", self.config.text_type.as_str()),
            ],
        )?;
        let body = model::text_payload(text)?;

        let res = self
            .http
            .send_request(Method::POST, &url, Some(body), "application/json")
            .await?;
        let results: model::OneOrMany<model::TranslationResult> = Self::parse_json(res).await?;

        results
            .into_vec()
            .into_iter()
            .flat_map(|result| result.translations)
            .map(|translation| translation.text)
            .next()
            .ok_or_else(|| Error::InvalidResponse("no translations returned".into()))
    }

    async fn request_detection(&self, text: &str) -> Result<LanguageCode> {
        let url = url_with_query(
            &self.config.detect_url,
            &[("api-version", self.config.api_version.as_str())],
        )?;
        let body = model::text_payload(text)?;

        let res = self
            .http
            .send_request(Method::POST, &url, Some(body), "application/json")
            .await?;
        let detections: model::OneOrMany<model::Detection> = Self::parse_json(res).await?;

        detections
            .into_vec()
            .into_iter()
            .map(|detection| detection.language)
            .find(|language| !language.is_empty())
            .ok_or_else(|| Error::InvalidResponse("no language detected".into()))
    }

    /// Decode a JSON response, surfacing the service's error payload first.
    async fn parse_json<T>(res: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (status, body) = read_body(res).await?;
        if let Ok(payload) = serde_json::from_str::<model::ErrorPayload>(&body) {
            return Err(payload.error.into());
        }
        check_status(status, &body)?;
        let value = serde_json::from_str(&body).map_err(DecodeError::from)?;
        Ok(value)
    }
}

mod model {
    use serde::{Deserialize, Serialize};

    use crate::error::ApiError;

    #[derive(Debug, Serialize)]
    pub struct TextItem<'a> {
        #[serde(rename = "Text")]
        pub text: &'a str,
    }

    pub fn text_payload(text: &str) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&[TextItem { text }])
    }

    /// The service answers with an array, one entry per input text.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    impl<T> OneOrMany<T> {
        pub fn into_vec(self) -> Vec<T> {
            match self {
                OneOrMany::Many(items) => items,
                OneOrMany::One(item) => vec![item],
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct TranslationResult {
        #[serde(default)]
        pub translations: Vec<Translation>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Translation {
        pub text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Detection {
        pub language: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorPayload {
        pub error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub code: i64,
        pub message: String,
    }

    impl From<ErrorBody> for ApiError {
        fn from(body: ErrorBody) -> Self {
            ApiError {
                code: body.code,
                message: body.message,
                details: None,
            }
        }
    }
}

impl From<model::ErrorBody> for Error {
    fn from(body: model::ErrorBody) -> Self {
        Error::Api(ApiError::from(body))
    }
}

#[async_trait::async_trait]
impl<Auth> crate::core::Translator for Provider<Auth>
where
    Auth: Authenticator,
{
    async fn languages(&self) -> Result<Vec<Language>> {
        let languages = self
            .languages
            .get_or_try_init(|| self.fetch_languages())
            .await?;
        Ok(languages.clone())
    }

    async fn translate(
        &self,
        text: &str,
        from: &LanguageCodeRef,
        to: &LanguageCodeRef,
    ) -> Result<String> {
        self.request_translation(text, from, to).await
    }

    async fn detect(&self, text: &str) -> Result<LanguageCode> {
        self.request_detection(text).await
    }
}
