use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_translate::error::DisplayErrorContext;
use thiserror::Error;

use crate::domain::ports::Translator;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation is disabled")]
    Disabled,
    #[error("translation request failed: {0}")]
    Request(String),
}

/// Amazon Translate client.
pub struct AwsTranslator {
    client: aws_sdk_translate::Client,
}

impl AwsTranslator {
    #[must_use]
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_translate::Client::new(sdk),
        }
    }
}

#[async_trait]
impl Translator for AwsTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let output = self
            .client
            .translate_text()
            .text(text)
            .source_language_code(source)
            .target_language_code(target)
            .send()
            .await
            .map_err(|e| TranslateError::Request(DisplayErrorContext(&e).to_string()))?;
        Ok(output.translated_text().to_owned())
    }
}

/// Stand-in used when AWS integration is switched off.
pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
        Err(TranslateError::Disabled.into())
    }
}
