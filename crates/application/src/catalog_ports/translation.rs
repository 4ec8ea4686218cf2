use std::collections::HashMap;

use bandstand_core::AppResult;

/// Message key to template mapping for one language.
pub type TranslationTable = HashMap<String, String>;

/// Source of bundled translation tables.
pub trait TranslationSource: Send + Sync {
    /// Returns the language codes the source can load.
    fn languages(&self) -> Vec<String>;

    /// Loads the table of one language, failing with `unsupportedLanguage`.
    fn load(&self, language: &str) -> AppResult<TranslationTable>;
}
