use crate::error::TranslateError;
use crate::services::translator::{backoff, should_retry_http, Translator, MAX_RETRIES, TIMEOUT_SECS};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use std::{thread, time::Duration};

pub struct AiConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

/// Chat-completion provider. The whole chunk goes out as one JSON array and
/// must come back as an array of the same length.
pub struct AiTranslator {
    client: Client,
    endpoint: &'static str,
    cfg: AiConfig,
}

fn endpoint_for(provider: &str) -> Result<&'static str, TranslateError> {
    match provider {
        "openai" => Ok("https://api.openai.com/v1/chat/completions"),
        "deepseek" => Ok("https://api.deepseek.com/v1/chat/completions"),
        other => Err(TranslateError::UnsupportedProvider(other.to_string())),
    }
}

fn default_model(provider: &str) -> &'static str {
    match provider {
        "deepseek" => "deepseek-chat",
        _ => "gpt-4o-mini",
    }
}

impl AiTranslator {
    pub fn new(mut cfg: AiConfig) -> Result<Self, TranslateError> {
        let endpoint = endpoint_for(&cfg.provider)?;

        if cfg.api_key.trim().is_empty() {
            return Err(TranslateError::Api {
                status: 401,
                message: format!("{} requires an api_key", cfg.provider),
            });
        }
        if cfg.model.trim().is_empty() {
            cfg.model = default_model(&cfg.provider).to_string();
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            cfg,
        })
    }

    fn request(&self, body: &Value) -> Result<String, TranslateError> {
        let mut last_err: Option<TranslateError> = None;

        for attempt in 0..MAX_RETRIES {
            let res = self
                .client
                .post(self.endpoint)
                .bearer_auth(&self.cfg.api_key)
                .json(body)
                .send();

            let resp = match res {
                Ok(r) => r,
                Err(err) => {
                    last_err = Some(err.into());
                    if attempt + 1 < MAX_RETRIES {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            let status = resp.status();

            // Read as text first so the error message survives a non-JSON body
            let text = match resp.text() {
                Ok(t) => t,
                Err(err) => {
                    last_err = Some(err.into());
                    if attempt + 1 < MAX_RETRIES {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            if !status.is_success() {
                last_err = Some(extract_error(status, &text));
                if should_retry_http(status) && attempt + 1 < MAX_RETRIES {
                    thread::sleep(backoff(attempt));
                    continue;
                }
                break;
            }

            return Ok(text);
        }

        Err(last_err.unwrap_or_else(|| TranslateError::InvalidResponse("no response".into())))
    }
}

impl Translator for AiTranslator {
    fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Vec<String>, TranslateError> {
        let body = json!({
            "model": self.cfg.model,
            "messages": [
                { "role": "system", "content": "You are a professional visual novel translator." },
                { "role": "user", "content": build_prompt(texts, target_lang) }
            ],
            "temperature": 0.3
        });

        let text = self.request(&body)?;
        let translations = parse_completion(&text)?;

        if translations.len() != texts.len() {
            return Err(TranslateError::LengthMismatch {
                expected: texts.len(),
                got: translations.len(),
            });
        }

        Ok(translations)
    }

    fn provider_name(&self) -> &str {
        &self.cfg.provider
    }
}

fn build_prompt(texts: &[String], target_lang: &str) -> String {
    let mut p = String::new();

    p.push_str(&format!(
        "Translate every string of the JSON array below into the language with code \"{}\".\n",
        target_lang
    ));
    p.push_str("Keep tokens like __0__ exactly as they are.\n");
    p.push_str(&format!(
        "Reply with a JSON array of exactly {} strings, same order, nothing else.\n",
        texts.len()
    ));
    p.push_str(&serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string()));

    p
}

fn parse_completion(body: &str) -> Result<Vec<String>, TranslateError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|_| TranslateError::InvalidResponse("invalid JSON from AI".into()))?;

    let content = v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| {
            TranslateError::InvalidResponse("missing choices[0].message.content".into())
        })?;

    parse_array(content)
}

/// Models like to wrap the array in a ```json fence; take the outermost brackets.
fn parse_array(content: &str) -> Result<Vec<String>, TranslateError> {
    let start = content.find('[');
    let end = content.rfind(']');

    let slice = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => {
            return Err(TranslateError::InvalidResponse(
                "AI reply contains no JSON array".into(),
            ))
        }
    };

    serde_json::from_str::<Vec<String>>(slice)
        .map_err(|e| TranslateError::InvalidResponse(format!("AI reply is not a string array: {e}")))
}

fn extract_error(status: StatusCode, body_text: &str) -> TranslateError {
    // Common shapes: { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return TranslateError::Api {
                status: status.as_u16(),
                message: msg.to_string(),
            };
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return TranslateError::Api {
                status: status.as_u16(),
                message: msg.to_string(),
            };
        }
    }

    let trimmed = body_text.trim();
    let message = if trimmed.chars().count() > 400 {
        format!("{}...", trimmed.chars().take(400).collect::<String>())
    } else {
        trimmed.to_string()
    };

    TranslateError::Api {
        status: status.as_u16(),
        message,
    }
}
