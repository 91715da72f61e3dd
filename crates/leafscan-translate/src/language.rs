/// A language offered to users of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Supported target languages. The first entry is the source language of
/// all label and advice files.
pub const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fr", name: "French" },
    Language { code: "de", name: "German" },
    Language { code: "bn", name: "Bengali" },
    Language { code: "ta", name: "Tamil" },
    Language { code: "te", name: "Telugu" },
];

/// Display name for a language code, if supported.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(code))
        .map(|l| l.name)
}
