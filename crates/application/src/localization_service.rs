use std::collections::HashMap;
use std::sync::Arc;

use bandstand_core::{AppError, AppResult, Message, MessageKey};

use crate::catalog_ports::{TranslationSource, TranslationTable};

/// Immutable set of translation tables loaded once at start-up.
#[derive(Clone)]
pub struct LocalizationService {
    tables: Arc<HashMap<String, TranslationTable>>,
    default_language: String,
}

impl LocalizationService {
    /// Loads every language the source offers.
    ///
    /// Fails when a table cannot be loaded or the default language is not
    /// among the loaded ones.
    pub fn load(source: &dyn TranslationSource, default_language: &str) -> AppResult<Self> {
        let mut tables = HashMap::new();
        for language in source.languages() {
            let table = source.load(&language)?;
            tables.insert(language.to_ascii_lowercase(), table);
        }

        let default_language = default_language.trim().to_ascii_lowercase();
        if !tables.contains_key(&default_language) {
            return Err(AppError::validation(
                Message::new(MessageKey::UnsupportedLanguage).with("language", default_language),
            ));
        }

        Ok(Self {
            tables: Arc::new(tables),
            default_language,
        })
    }

    /// Returns the language used when a request expresses no usable preference.
    #[must_use]
    pub fn default_language(&self) -> &str {
        self.default_language.as_str()
    }

    /// Returns whether a table was loaded for the language.
    #[must_use]
    pub fn is_supported(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }

    /// Picks the first loaded language of an `Accept-Language` header.
    #[must_use]
    pub fn negotiate(&self, accept_language: Option<&str>) -> String {
        accept_language
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|entry| {
                let tag = entry.split(';').next()?.trim();
                let primary = tag.split(['-', '_']).next()?.trim().to_ascii_lowercase();
                (!primary.is_empty()).then_some(primary)
            })
            .find(|language| self.is_supported(language))
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// Renders a message, falling back to its key when no template exists.
    #[must_use]
    pub fn translate(&self, language: &str, message: &Message) -> String {
        self.tables
            .get(language)
            .and_then(|table| table.get(message.key().as_str()))
            .map(|template| message.interpolate(template))
            .unwrap_or_else(|| message.key().as_str().to_owned())
    }
}
