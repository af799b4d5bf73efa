use crate::error::TranslateError;
use crate::services::translator::{backoff, should_retry_http, Translator, MAX_RETRIES, TIMEOUT_SECS};

use reqwest::blocking::Client;
use serde_json::Value;

use std::{thread, time::Duration};

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google's keyless `client=gtx` web endpoint.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self, TranslateError> {
        Self::with_endpoint(ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn translate_one(&self, text: &str, target_lang: &str) -> Result<String, TranslateError> {
        let mut last_err: Option<TranslateError> = None;

        for attempt in 0..MAX_RETRIES {
            let res = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("sl", "auto"),
                    ("tl", target_lang),
                    ("dt", "t"),
                    ("q", text),
                ])
                .send();

            let resp = match res {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(e.into());
                    if attempt + 1 < MAX_RETRIES {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            let status = resp.status();
            let body = match resp.text() {
                Ok(b) => b,
                Err(e) => {
                    last_err = Some(e.into());
                    if attempt + 1 < MAX_RETRIES {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            if !status.is_success() {
                last_err = Some(TranslateError::Api {
                    status: status.as_u16(),
                    message: snippet(&body),
                });
                if should_retry_http(status) && attempt + 1 < MAX_RETRIES {
                    thread::sleep(backoff(attempt));
                    continue;
                }
                break;
            }

            return parse_response(&body);
        }

        Err(last_err.unwrap_or_else(|| TranslateError::InvalidResponse("no response".into())))
    }
}

impl Translator for GoogleTranslator {
    fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Vec<String>, TranslateError> {
        texts
            .iter()
            .map(|t| self.translate_one(t, target_lang))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}

/// The body looks like `[[["Hola","Hello",null,null,1],...],null,"en",...]`:
/// one segment per sentence, translated text first.
fn parse_response(body: &str) -> Result<String, TranslateError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| TranslateError::InvalidResponse(format!("invalid JSON: {e}")))?;

    let segments = v
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| TranslateError::InvalidResponse("missing sentence array".into()))?;

    Ok(segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect())
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > 400 {
        let cut: String = trimmed.chars().take(400).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_joins_sentences() {
        let body = r#"[[["สวัสดี ","Hello. ",null,null,10],["__0__ โลก","__0__ world",null,null,10]],null,"en"]"#;
        assert_eq!(parse_response(body).unwrap(), "สวัสดี __0__ โลก");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_response("<html>"),
            Err(TranslateError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_response("{\"a\": 1}"),
            Err(TranslateError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_snippet_is_char_safe() {
        let long = "ก".repeat(500);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), 403);
    }

    #[test]
    fn test_truncated_body_is_retried() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = stream.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                // promise 100 bytes, send two, hang up
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\n[[",
                );
            }
        });

        let google = GoogleTranslator::with_endpoint(&format!("http://{addr}/")).unwrap();
        let err = google.translate_batch(&["Hello".to_string()], "th").unwrap_err();

        assert!(matches!(err, TranslateError::Http(_)));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_RETRIES);
    }
}
