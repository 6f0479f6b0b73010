//! Two-language UI preference, persisted across sessions.

use crate::session::SessionStore;

/// Session-store key for the preference
pub const LANGUAGE_KEY: &str = "preferredLanguage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::En),
            "ru" => Some(Language::Ru),
            _ => None,
        }
    }

    /// The other language, for the toggle button
    pub fn toggled(&self) -> Language {
        match self {
            Language::En => Language::Ru,
            Language::Ru => Language::En,
        }
    }
}

pub fn save_preferred_language(store: &dyn SessionStore, language: Language) {
    if let Err(e) = store.set(LANGUAGE_KEY, language.as_str()) {
        log::warn!("Could not persist language preference: {}", e);
    }
}

/// The stored preference, or None when absent or unrecognized
pub fn load_preferred_language(store: &dyn SessionStore) -> Option<Language> {
    store
        .get(LANGUAGE_KEY)
        .and_then(|code| Language::from_code(&code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    #[test]
    fn test_save_and_load_round_trip() {
        let store = MemorySessionStore::new();

        assert_eq!(load_preferred_language(&store), None);

        save_preferred_language(&store, Language::Ru);
        assert_eq!(load_preferred_language(&store), Some(Language::Ru));
    }

    #[test]
    fn test_unrecognized_code_is_ignored() {
        let store = MemorySessionStore::new();
        store.set(LANGUAGE_KEY, "de").unwrap();

        assert_eq!(load_preferred_language(&store), None);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Language::En.toggled(), Language::Ru);
        assert_eq!(Language::Ru.toggled(), Language::En);
    }
}
