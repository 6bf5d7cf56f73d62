//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use fbdocbot::localization::{t_args_lang, t_lang, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    /// Keys the bot shell looks up; every bundled language must define them
    const REQUIRED_KEYS: &[&str] = &[
        "welcome",
        "help-text",
        "create-doc-menu",
        "manual-ask-uids",
        "instant-prompt",
        "ask-filename",
        "document-caption",
        "render-failed",
        "error-invalid-uid",
        "error-count-mismatch",
        "error-password-count-mismatch",
        "error-insufficient-lines",
        "error-missing-delimiter",
        "error-invalid-filename",
        "inventory-info",
        "inventory-empty",
        "access-blocked",
        "access-not-whitelisted",
        "access-expired",
        "admin-stats",
        "admin-broadcast-done",
        "button-cancel",
        "button-skip-password",
    ];

    #[test]
    fn test_every_language_defines_required_keys() {
        let manager = setup_localization();

        for language in ["en", "id"] {
            for key in REQUIRED_KEYS {
                let message = manager.get_message_in_language(key, language, None);
                assert!(
                    !message.starts_with("Missing translation:"),
                    "{language} is missing {key}"
                );
            }
        }
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-text", "en", None);
        assert!(message.contains("/manual"));
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("help-text", "unsupported", None);
        // Should fall back to English
        assert!(message.contains("Commands"));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("uids", "2");
        args.insert("passwords", "1");
        args.insert("cookies", "2");

        let message = manager.get_message_in_language("error-count-mismatch", "en", Some(&args));
        assert!(message.contains("UID=2, PASSWORD=1, COOKIE=2"));

        let message = manager.get_message_in_language("error-count-mismatch", "id", Some(&args));
        assert!(message.contains("UID=2, PASSWORD=1, COOKIE=2"));
        assert!(message.contains("harus sama"));
    }

    #[test]
    fn test_resolve_language_from_telegram_codes() {
        let manager = setup_localization();

        assert_eq!(manager.resolve_language(Some("id")), "id");
        assert_eq!(manager.resolve_language(Some("en-US")), "en");
        assert_eq!(manager.resolve_language(Some("ID_id")), "id");
        assert_eq!(manager.resolve_language(Some("fr")), "en");
        assert_eq!(manager.resolve_language(None), "en");
    }

    #[test]
    fn test_fallback_language_override() {
        let manager = LocalizationManager::with_fallback("id").expect("bundles load");
        assert_eq!(manager.resolve_language(Some("de")), "id");

        // Unknown fallback reverts to English
        let manager = LocalizationManager::with_fallback("xx").expect("bundles load");
        assert_eq!(manager.resolve_language(None), "en");
    }

    #[test]
    fn test_global_helpers() {
        let message = t_args_lang("admin-whitelist-added", &[("user_id", "42")], Some("en"));
        assert!(message.contains("42"));
        assert!(!message.contains('\u{2068}'), "isolation marks must be disabled");

        assert_eq!(t_lang("button-cancel", Some("id")), "Batal");
        assert_eq!(t_lang("button-cancel", Some("en-GB")), "Cancel");
    }
}
