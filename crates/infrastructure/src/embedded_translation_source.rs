use bandstand_application::{TranslationSource, TranslationTable};
use bandstand_core::{AppError, AppResult, Message, MessageKey};

const BUNDLED: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.json")),
    ("fr", include_str!("../locales/fr.json")),
];

/// Translation tables compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTranslationSource;

impl EmbeddedTranslationSource {
    /// Creates the bundled source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TranslationSource for EmbeddedTranslationSource {
    fn languages(&self) -> Vec<String> {
        BUNDLED
            .iter()
            .map(|(language, _)| (*language).to_owned())
            .collect()
    }

    fn load(&self, language: &str) -> AppResult<TranslationTable> {
        let (_, raw) = BUNDLED
            .iter()
            .find(|(bundled, _)| bundled.eq_ignore_ascii_case(language))
            .ok_or_else(|| {
                AppError::validation(
                    Message::new(MessageKey::UnsupportedLanguage).with("language", language),
                )
            })?;

        serde_json::from_str(raw).map_err(|error| {
            AppError::Internal(format!(
                "bundled translation table '{language}' is invalid: {error}"
            ))
        })
    }
}
