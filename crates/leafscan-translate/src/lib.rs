//! Translation of result text, with failures absorbed into the original text.

mod language;
mod service;
#[cfg(feature = "http")]
mod http;

pub use language::{LANGUAGES, Language, language_name};
pub use service::{TranslateError, TranslationService, Translator};
#[cfg(feature = "http")]
pub use http::GoogleTranslator;
