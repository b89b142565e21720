use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;
use translator::{google, microsoft, Translator};

const TEXT: &str = "Hello World!";
const SOURCE_LANGUAGE: &str = "en";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let reqwest_client = reqwest::Client::builder()
        .build()
        .context("building http client")?;

    let provider = std::env::var("TRANSLATOR_PROVIDER").unwrap_or_else(|_| "microsoft".into());
    let translator: Arc<dyn Translator> = match provider.as_str() {
        "microsoft" => {
            let credentials = match std::env::var("MICROSOFT_SUBSCRIPTION_KEY") {
                Ok(key) => microsoft::auth::Credentials::SubscriptionKey(key),
                Err(_) => microsoft::auth::Credentials::ClientCredentials {
                    client_id: getenv("MICROSOFT_CLIENT_ID")?,
                    client_secret: getenv("MICROSOFT_CLIENT_SECRET")?,
                },
            };
            Arc::new(microsoft::Provider::new(
                reqwest_client,
                credentials,
                microsoft::Config::default(),
            ))
        }
        "google" => Arc::new(google::Provider::new(
            reqwest_client,
            getenv("GOOGLE_API_KEY")?,
            google::Config::default(),
        )),
        other => anyhow::bail!("unknown provider {:?}, expected microsoft or google", other),
    };

    hello_world(translator).await
}

/// Fetch the catalog, then translate the greeting into every language at once.
async fn hello_world(translator: Arc<dyn Translator>) -> anyhow::Result<()> {
    let languages = translator
        .languages()
        .await
        .context("retrieving languages")?;

    info!(message = "Translating", languages = languages.len());
    println!("{} Supported Languages:", languages.len());
    println!("-----------------------");

    let mut translations = JoinSet::new();
    for language in languages {
        let translator = Arc::clone(&translator);
        translations.spawn(async move {
            let result = translator
                .translate(TEXT, SOURCE_LANGUAGE, &language.code)
                .await;
            (language, result)
        });
    }

    while let Some(joined) = translations.join_next().await {
        let (language, result) = joined.context("translation task panicked")?;
        match result {
            Ok(translation) => println!("{} [{}]: {}", language.name, language.code, translation),
            Err(err) => println!("Error during translation for {}: {}", language.name, err),
        }
    }

    Ok(())
}

fn getenv(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("env var {} is not set", key))
}
