//! HTTP translator backed by Google Translate's public `translate_a/single`
//! endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::service::{TranslateError, Translator};

const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate client.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a client for the public endpoint.
    ///
    /// `request_timeout` bounds each HTTP request on top of the service-level
    /// timeout in [`TranslationService`](crate::TranslationService).
    pub fn new(request_timeout: Duration) -> Result<Self, TranslateError> {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), request_timeout)
    }

    /// Create a client for a compatible endpoint (no trailing slash needed).
    pub fn with_endpoint(endpoint: String, request_timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        debug!(url = %self.endpoint, source, target_lang = target, chars = text.len(), "translating");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 400 {
            return Err(TranslateError::UnsupportedLanguage(target.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranslateError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await?;
        let translated = parse_segments(&body)?;
        info!(target_lang = target, chars = translated.len(), "translation complete");
        Ok(translated)
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The body looks like `[[["Hola ", "Hello ", ...], ["mundo", "world", ...]], null, "en", ...]`.
fn parse_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::Malformed("missing segment list".into()))?;

    let mut out = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            out.push_str(part);
        }
    }

    if out.is_empty() {
        return Err(TranslateError::Malformed("no translated text".into()));
    }
    Ok(out)
}
