use crate::error::Result;

pub type LanguageCode = String;
pub type LanguageCodeRef = str;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub code: LanguageCode,
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<LanguageCode>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A translation service.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Languages supported by the service.
    async fn languages(&self) -> Result<Vec<Language>>;

    /// Translate `text` between two languages given by their codes.
    async fn translate(
        &self,
        text: &str,
        from: &LanguageCodeRef,
        to: &LanguageCodeRef,
    ) -> Result<String>;

    /// Detect the language of `text`, returning its code.
    async fn detect(&self, text: &str) -> Result<LanguageCode>;
}

/// Pair codes with names positionally.
pub(crate) fn zip_languages(codes: Vec<LanguageCode>, names: Vec<String>) -> Result<Vec<Language>> {
    if codes.len() != names.len() {
        return Err(crate::Error::InvalidResponse(format!(
            "got {} language names for {} codes",
            names.len(),
            codes.len()
        )));
    }
    let languages = codes
        .into_iter()
        .zip(names)
        .map(|(code, name)| Language { code, name })
        .collect();
    Ok(languages)
}
