//! Google Translate provider implementation.

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;

use self::auth::ApiKeyAuthenticator;
use crate::{
    core::{Language, LanguageCode, LanguageCodeRef},
    error::{Error, Result},
    http::{self, check_status, read_body, url_with_query},
};

pub mod auth;

const BASE_URL: &str = "https://www.googleapis.com/language/translate/v2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub languages_url: String,
    pub translate_url: String,
    pub detect_url: String,
    /// Language the catalog names are reported in.
    pub target: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::rooted_at(BASE_URL)
    }
}

impl Config {
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            languages_url: format!("{}/languages", base),
            translate_url: base.to_owned(),
            detect_url: format!("{}/detect", base),
            target: "en".to_owned(),
        }
    }
}

pub struct Provider {
    http: http::Client<ApiKeyAuthenticator>,
    config: Config,
    languages: OnceCell<Vec<Language>>,
}

impl Provider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, config: Config) -> Self {
        Self {
            http: http::Client::new(client, ApiKeyAuthenticator::new(api_key)),
            config,
            languages: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn fetch_languages(&self) -> Result<Vec<Language>> {
        let url = url_with_query(
            &self.config.languages_url,
            &[("target", self.config.target.as_str())],
        )?;
        let payload: model::Response<model::LanguagesData> = self.get_json(&url).await?;

        let languages: Vec<_> = payload
            .data
            .languages
            .into_iter()
            .map(|language| Language {
                code: language.language,
                name: language.name,
            })
            .collect();
        debug!(message = "Fetched language catalog", languages = languages.len());
        Ok(languages)
    }

    async fn request_translation(
        &self,
        text: &str,
        from: &LanguageCodeRef,
        to: &LanguageCodeRef,
    ) -> Result<String> {
        let url = url_with_query(
            &self.config.translate_url,
            &[("q", text), ("source", from), ("target", to)],
        )?;
        let payload: model::Response<model::TranslationsData> = self.get_json(&url).await?;

        payload
            .data
            .translations
            .into_iter()
            .map(|translation| translation.translated_text)
            .next()
            .ok_or_else(|| Error::InvalidResponse("no translations returned".into()))
    }

    async fn request_detection(&self, text: &str) -> Result<LanguageCode> {
        let url = url_with_query(&self.config.detect_url, &[("q", text)])?;
        let payload: model::Response<model::DetectionsData> = self.get_json(&url).await?;

        payload
            .data
            .detections
            .into_iter()
            .flatten()
            .map(|detection| detection.language)
            .next()
            .ok_or_else(|| Error::InvalidResponse("no language detected".into()))
    }

    async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let res = self
            .http
            .send_request(Method::GET, url, None, "text/plain")
            .await?;
        Self::parse_json(res).await
    }

    /// Decode a JSON response. The error payload takes precedence over the
    /// status code since it carries more detail.
    async fn parse_json<T>(res: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (status, body) = read_body(res).await?;
        if let Ok(payload) = serde_json::from_str::<model::ErrorPayload>(&body) {
            if payload.error.code != 0 {
                return Err(Error::Api(payload.error.into()));
            }
        }
        check_status(status, &body)?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}

mod model {
    use serde::Deserialize;

    use crate::error::ApiError;

    #[derive(Debug, Deserialize)]
    pub struct Response<T> {
        pub data: T,
    }

    #[derive(Debug, Deserialize)]
    pub struct LanguagesData {
        #[serde(default)]
        pub languages: Vec<LanguageEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct LanguageEntry {
        pub language: String,
        #[serde(default)]
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct TranslationsData {
        #[serde(default)]
        pub translations: Vec<Translation>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Translation {
        pub translated_text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct DetectionsData {
        #[serde(default)]
        pub detections: Vec<Vec<Detection>>,
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
        #[serde(default)]
        pub code: i64,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub errors: Vec<ErrorDetail>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorDetail {
        #[serde(default)]
        pub domain: String,
        #[serde(default)]
        pub reason: String,
    }

    impl From<ErrorBody> for ApiError {
        fn from(body: ErrorBody) -> Self {
            let details = body
                .errors
                .first()
                .map(|detail| format!("{}/{}", detail.domain, detail.reason));
            ApiError {
                code: body.code,
                message: body.message,
                details,
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::core::Translator for Provider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn default_endpoints() {
        let config = Config::default();
        assert_eq!(
            config.languages_url,
            "https://www.googleapis.com/language/translate/v2/languages"
        );
        assert_eq!(
            config.translate_url,
            "https://www.googleapis.com/language/translate/v2"
        );
        assert_eq!(
            config.detect_url,
            "https://www.googleapis.com/language/translate/v2/detect"
        );
    }

    #[test]
    fn error_payload_details() {
        let payload: model::ErrorPayload = serde_json::from_str(
            r#"{
                "error": {
                    "errors": [{"domain": "global", "reason": "invalid", "message": "Invalid Value"}],
                    "code": 400,
                    "message": "Invalid Value"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            ApiError::from(payload.error),
            ApiError {
                code: 400,
                message: "Invalid Value".into(),
                details: Some("global/invalid".into()),
            }
        );
    }

    #[test]
    fn detections_are_nested() {
        let payload: model::Response<model::DetectionsData> = serde_json::from_str(
            r#"{"data":{"detections":[[{"language":"de","isReliable":false,"confidence":0.66}]]}}"#,
        )
        .unwrap();
        assert_eq!(payload.data.detections[0][0].language, "de");
    }
}
