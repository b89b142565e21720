//! Language catalog backed by the XML `ArrayOfstring` endpoints.

use quick_xml::escape::escape;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::Provider;
use crate::{
    core::{zip_languages, Language, LanguageCode},
    error::Result,
    http::{check_status, read_body, url_with_query, Authenticator},
};

const ARRAYS_NAMESPACE: &str = "http://schemas.microsoft.com/2003/10/Serialization/Arrays";
const INSTANCE_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

#[derive(Debug, Default, Deserialize)]
#[serde(rename = "ArrayOfstring")]
pub(crate) struct ArrayOfStrings {
    #[serde(rename = "string", default)]
    pub strings: Vec<String>,
}

impl ArrayOfStrings {
    pub fn to_xml(values: &[String]) -> String {
        let mut xml = format!(
            r#"<ArrayOfstring xmlns="{}" xmlns:i="{}">"#,
            ARRAYS_NAMESPACE, INSTANCE_NAMESPACE
        );
        for value in values {
            xml.push_str("<string>");
            xml.push_str(&escape(value.as_str()));
            xml.push_str("</string>");
        }
        xml.push_str("</ArrayOfstring>");
        xml
    }

    pub fn from_xml(xml: &str) -> Result<Vec<String>> {
        let array: ArrayOfStrings = quick_xml::de::from_str(xml)?;
        Ok(array.strings)
    }
}

impl<Auth> Provider<Auth>
where
    Auth: Authenticator,
{
    pub(super) async fn fetch_languages(&self) -> Result<Vec<Language>> {
        let codes = self.language_codes().await?;
        let names = self.language_names(&codes).await?;
        let languages = zip_languages(codes, names)?;
        debug!(message = "Fetched language catalog", languages = languages.len());
        Ok(languages)
    }

    /// Codes of all languages the service translates between.
    async fn language_codes(&self) -> Result<Vec<LanguageCode>> {
        let res = self
            .http
            .send_request(Method::GET, &self.config.language_codes_url, None, "text/plain")
            .await?;
        Self::parse_xml(res).await
    }

    /// Display names for `codes`, in the same order.
    async fn language_names(&self, codes: &[LanguageCode]) -> Result<Vec<String>> {
        let url = url_with_query(
            &self.config.language_names_url,
            &[("locale", self.config.locale.as_str())],
        )?;
        let payload = ArrayOfStrings::to_xml(codes);

        let res = self
            .http
            .send_request(Method::POST, &url, Some(payload.into_bytes()), "text/xml")
            .await?;
        Self::parse_xml(res).await
    }

    async fn parse_xml(res: reqwest::Response) -> Result<Vec<String>> {
        let (status, body) = read_body(res).await?;
        check_status(status, &body)?;
        ArrayOfStrings::from_xml(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn encodes_with_namespaces() {
        let xml = ArrayOfStrings::to_xml(&strings(&["en", "de"]));
        assert_eq!(
            xml,
            "<ArrayOfstring xmlns=\"http://schemas.microsoft.com/2003/10/Serialization/Arrays\" \
             xmlns:i=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <string>en</string><string>de</string></ArrayOfstring>"
        );
    }

    #[test]
    fn escapes_values() {
        let xml = ArrayOfStrings::to_xml(&strings(&["a<b&c"]));
        assert!(xml.contains("<string>a&lt;b&amp;c</string>"));
        assert_eq!(ArrayOfStrings::from_xml(&xml).unwrap(), strings(&["a<b&c"]));
    }

    #[test]
    fn decodes_service_response() {
        let xml = r#"<ArrayOfstring xmlns="http://schemas.microsoft.com/2003/10/Serialization/Arrays" xmlns:i="http://www.w3.org/2001/XMLSchema-instance"><string>English</string><string>German</string><string>Chinese (Traditional)</string></ArrayOfstring>"#;
        assert_eq!(
            ArrayOfStrings::from_xml(xml).unwrap(),
            strings(&["English", "German", "Chinese (Traditional)"])
        );
    }

    #[test]
    fn decodes_empty_array() {
        let xml = ArrayOfStrings::to_xml(&[]);
        assert!(ArrayOfStrings::from_xml(&xml).unwrap().is_empty());
    }

    #[test]
    fn codes_map_to_names_in_order() {
        let codes = strings(&["en", "de", "es", "ru", "ja"]);
        let request = ArrayOfStrings::to_xml(&codes);
        assert_eq!(ArrayOfStrings::from_xml(&request).unwrap(), codes);

        let names = strings(&["English", "German", "Spanish", "Russian", "Japanese"]);
        let response = ArrayOfStrings::to_xml(&names);
        let languages = zip_languages(
            ArrayOfStrings::from_xml(&request).unwrap(),
            ArrayOfStrings::from_xml(&response).unwrap(),
        )
        .unwrap();

        for (i, language) in languages.iter().enumerate() {
            assert_eq!(language.code, codes[i]);
            assert_eq!(language.name, names[i]);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(ArrayOfStrings::from_xml("<ArrayOfstring><string>en</string>").is_err());
    }
}
