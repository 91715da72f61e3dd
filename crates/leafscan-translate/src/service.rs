//! Translator interface and the fallback policy around it.
//!
//! Backends report failure through [`TranslateError`]. The only place that
//! turns a failure back into the original text is
//! [`TranslationService::translate_or_original`]; disease detection never
//! depends on the translation backend being reachable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),
    #[error("translation is disabled")]
    Disabled,
}

/// External text translation capability.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError>;
}

/// Bounded, fallback-safe access to an optional [`Translator`].
#[derive(Clone)]
pub struct TranslationService {
    backend: Option<Arc<dyn Translator>>,
    source_language: String,
    timeout: Duration,
}

impl TranslationService {
    pub fn new(backend: Arc<dyn Translator>, source_language: &str, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            source_language: source_language.to_string(),
            timeout,
        }
    }

    /// A service that never calls out; every non-trivial request falls back.
    pub fn disabled(source_language: &str) -> Self {
        Self {
            backend: None,
            source_language: source_language.to_string(),
            timeout: Duration::ZERO,
        }
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Translate `text`, reporting why if it could not be done.
    ///
    /// Text already in the source language, or empty text, comes back
    /// unchanged without touching the backend.
    pub async fn attempt(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        if text.is_empty() || target.eq_ignore_ascii_case(&self.source_language) {
            return Ok(text.to_string());
        }
        let backend = self.backend.as_ref().ok_or(TranslateError::Disabled)?;

        match tokio::time::timeout(
            self.timeout,
            backend.translate(text, &self.source_language, target),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout(self.timeout)),
        }
    }

    /// Translate `text`, or return it unchanged on any failure.
    pub async fn translate_or_original(&self, text: &str, target: &str) -> String {
        match self.attempt(text, target).await {
            Ok(translated) => translated,
            Err(e) => {
                debug!(target_lang = target, error = %e, "translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upper-cases text and counts calls.
    #[derive(Default)]
    struct ShoutingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for ShoutingTranslator {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_uppercase())
        }
    }

    struct BrokenTranslator;

    #[async_trait]
    impl Translator for BrokenTranslator {
        async fn translate(
            &self,
            _text: &str,
            _source: &str,
            target: &str,
        ) -> Result<String, TranslateError> {
            Err(TranslateError::UnsupportedLanguage(target.to_string()))
        }
    }

    struct SlowTranslator;

    #[async_trait]
    impl Translator for SlowTranslator {
        async fn translate(
            &self,
            text: &str,
            _source: &str,
            _target: &str,
        ) -> Result<String, TranslateError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(text.to_uppercase())
        }
    }

    fn service(backend: Arc<dyn Translator>) -> TranslationService {
        TranslationService::new(backend, "en", Duration::from_millis(100))
    }

    #[tokio::test]
    async fn translates_to_other_language() {
        let backend = Arc::new(ShoutingTranslator::default());
        let svc = service(backend.clone());
        assert_eq!(svc.translate_or_original("leaf rust", "hi").await, "LEAF RUST");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn source_language_skips_backend() {
        let backend = Arc::new(ShoutingTranslator::default());
        let svc = service(backend.clone());
        assert_eq!(svc.translate_or_original("leaf rust", "en").await, "leaf rust");
        assert_eq!(svc.translate_or_original("leaf rust", "EN").await, "leaf rust");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_text_skips_backend() {
        let backend = Arc::new(ShoutingTranslator::default());
        let svc = service(backend.clone());
        assert_eq!(svc.translate_or_original("", "fr").await, "");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_falls_back_to_original() {
        let svc = service(Arc::new(BrokenTranslator));
        assert!(matches!(
            svc.attempt("leaf rust", "xx").await,
            Err(TranslateError::UnsupportedLanguage(_))
        ));
        assert_eq!(svc.translate_or_original("leaf rust", "xx").await, "leaf rust");
    }

    #[tokio::test]
    async fn timeout_falls_back_to_original() {
        let svc = service(Arc::new(SlowTranslator));
        assert!(matches!(
            svc.attempt("leaf rust", "de").await,
            Err(TranslateError::Timeout(_))
        ));
        assert_eq!(svc.translate_or_original("leaf rust", "de").await, "leaf rust");
    }

    #[tokio::test]
    async fn disabled_service_returns_original() {
        let svc = TranslationService::disabled("en");
        assert!(!svc.is_enabled());
        assert!(matches!(
            svc.attempt("leaf rust", "ta").await,
            Err(TranslateError::Disabled)
        ));
        assert_eq!(svc.translate_or_original("leaf rust", "ta").await, "leaf rust");
    }
}
