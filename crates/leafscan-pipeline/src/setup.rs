use leafscan_core::Settings;
use leafscan_translate::TranslationService;
#[cfg(feature = "http")]
use std::sync::Arc;
#[cfg(not(feature = "http"))]
use tracing::warn;

/// Build the translation service described by `settings`.
///
/// Without the `http` feature there is no backend to call, so translation is
/// disabled and results keep their source-language text.
pub fn translation_service(settings: &Settings) -> anyhow::Result<TranslationService> {
    if !settings.translation_enabled {
        return Ok(TranslationService::disabled(&settings.source_language));
    }

    #[cfg(feature = "http")]
    {
        use leafscan_translate::GoogleTranslator;

        let timeout = settings.translation_timeout();
        let backend = match &settings.translation_endpoint {
            Some(endpoint) => GoogleTranslator::with_endpoint(endpoint.clone(), timeout)?,
            None => GoogleTranslator::new(timeout)?,
        };
        Ok(TranslationService::new(
            Arc::new(backend),
            &settings.source_language,
            timeout,
        ))
    }

    #[cfg(not(feature = "http"))]
    {
        warn!("built without the http feature, translation disabled");
        Ok(TranslationService::disabled(&settings.source_language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_settings() {
        let settings = Settings {
            translation_enabled: false,
            ..Settings::default()
        };
        let svc = translation_service(&settings).unwrap();
        assert!(!svc.is_enabled());
        assert_eq!(svc.source_language(), "en");
    }
}
