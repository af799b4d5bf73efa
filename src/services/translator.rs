//! The seam to the external translation service.
//!
//! A provider gets one chunk of already-masked strings and the target language
//! code, and answers with the translations in the same order. Providers are
//! blocking; the job runs one chunk at a time.

use crate::error::TranslateError;
use crate::model::settings::Settings;
use crate::services::{ai, google};

use rand::{thread_rng, Rng};
use reqwest::StatusCode;
use std::time::Duration;

pub(crate) const MAX_RETRIES: usize = 3;
pub(crate) const TIMEOUT_SECS: u64 = 60;
const BASE_DELAY_MS: u64 = 800;

pub(crate) fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

pub(crate) fn should_retry_http(status: StatusCode) -> bool {
    // 408/429/5xx are usually transient
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

pub trait Translator {
    fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Vec<String>, TranslateError>;

    fn provider_name(&self) -> &str;
}

/// Builds the provider named in the settings.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn Translator>, TranslateError> {
    match settings.provider.as_str() {
        "google" => Ok(Box::new(google::GoogleTranslator::new()?)),
        "openai" | "deepseek" => Ok(Box::new(ai::AiTranslator::new(ai::AiConfig {
            provider: settings.provider.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })?)),
        other => Err(TranslateError::UnsupportedProvider(other.to_string())),
    }
}
