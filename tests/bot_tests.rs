use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fbdocbot::access::{AccessDecision, AccessStore, AdminIds, StatsSummary};
use fbdocbot::bot::ui_builder::*;
use fbdocbot::bot::{schema, BotContext};
use fbdocbot::errors::{CookieRule, Field, ValidationError};
use fbdocbot::inventory::{InMemoryInventoryStore, InventoryError, InventoryMeta};
use fbdocbot::localization::init_localization;
use teloxide::types::{InlineKeyboardButtonKind, KeyboardMarkup};

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() {
        // Initialize localization if not already done
        let _ = init_localization("en");
    }

    fn labels(markup: &KeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .keyboard
            .iter()
            .map(|row| row.iter().map(|button| button.text.clone()).collect())
            .collect()
    }

    /// Test main menu layout for regular users and admins
    #[test]
    fn test_main_menu_layout() {
        let user = labels(&main_menu_keyboard(false));
        assert_eq!(user[0], vec![MAIN_MENU_CREATE_DOC]);
        assert_eq!(user[1], vec![MAIN_MENU_INVENTORY]);
        assert!(user.iter().flatten().all(|label| label != MAIN_MENU_ADMIN));

        let admin = labels(&main_menu_keyboard(true));
        assert_eq!(admin.last().unwrap(), &vec![MAIN_MENU_ADMIN.to_string()]);
    }

    /// Every submenu offers a way back
    #[test]
    fn test_submenus_have_back_button() {
        for markup in [create_doc_keyboard(), inventory_keyboard(), admin_keyboard()] {
            let all: Vec<String> = labels(&markup).into_iter().flatten().collect();
            assert!(all.contains(&SUBMENU_BACK.to_string()));
        }
    }

    /// Test inline keyboards carry the expected callback data
    #[test]
    fn test_inline_keyboard_callbacks() {
        setup_localization();

        let cancel = inline_cancel_keyboard(CB_CANCEL_INPUT, Some("en"));
        let button = &cancel.inline_keyboard[0][0];
        assert!(button.text.contains("Cancel"));
        assert!(matches!(
            &button.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == CB_CANCEL_INPUT
        ));

        let skip = skip_password_keyboard(Some("id"));
        let data: Vec<&str> = skip
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec![CB_INVENTORY_SKIP_PASSWORD, CB_INVENTORY_CANCEL]);
        assert!(skip.inline_keyboard[0][0].text.contains("Lewati"));
    }

    /// Test validation errors are described with their details
    #[test]
    fn test_validation_error_messages() {
        setup_localization();

        let mismatch = describe_validation_error(
            &ValidationError::CountMismatch {
                uids: 3,
                passwords: 2,
                cookies: Some(3),
            },
            Some("en"),
        );
        assert!(mismatch.contains("UID=3, PASSWORD=2, COOKIE=3"));

        // Before the cookie step only the two submitted counts are reported
        let early = describe_validation_error(
            &ValidationError::CountMismatch {
                uids: 2,
                passwords: 1,
                cookies: None,
            },
            Some("en"),
        );
        assert!(early.contains("UID=2, PASSWORD=1"));
        assert!(!early.contains("COOKIE"));

        let cookie = describe_validation_error(
            &ValidationError::InvalidFormat {
                field: Field::Cookie,
                index: 2,
                value: "c_user=1".to_string(),
                rule: Some(CookieRule::TooShort),
            },
            Some("en"),
        );
        assert!(cookie.contains("#2"));
        assert!(cookie.contains("20 characters"));

        // User input is HTML-escaped
        let uid = describe_validation_error(
            &ValidationError::InvalidFormat {
                field: Field::Uid,
                index: 1,
                value: "<b>".to_string(),
                rule: None,
            },
            Some("en"),
        );
        assert!(uid.contains("&lt;b&gt;"));

        let empty = describe_validation_error(
            &ValidationError::EmptyField {
                field: Field::Password,
            },
            Some("id"),
        );
        assert!(empty.contains("password"));
    }

    #[test]
    fn test_inventory_and_access_messages() {
        setup_localization();

        assert!(describe_inventory_error(&InventoryError::MissingXs, Some("en")).contains("xs"));
        assert!(describe_access_decision(AccessDecision::Granted, Some("en")).is_empty());
        assert!(describe_access_decision(AccessDecision::Expired, Some("en")).contains("expired"));
        assert!(describe_access_decision(AccessDecision::Blocked, Some("id")).contains("diblokir"));
    }

    #[test]
    fn test_info_and_stats_formatting() {
        setup_localization();

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let meta = InventoryMeta {
            last_uid: "12345678".to_string(),
            last_password_empty: true,
            last_input_at: Some(at),
        };
        let info = format_inventory_info(2, &meta, Some("en"));
        assert!(info.contains("Accounts: 2"));
        assert!(info.contains("12345678"));
        assert!(info.contains("skipped"));
        assert!(info.contains("2024-05-01 08:30:00 UTC"));

        let summary = StatsSummary {
            total_users: 4,
            active_whitelisted: 2,
            blocked: 1,
            total_docs_created: 7,
            total_messages_processed: 30,
            last_broadcast_at: None,
        };
        let stats = format_stats(&summary, Some("en"));
        assert!(stats.contains("Users: 4"));
        assert!(stats.contains("Documents created: 7"));
        assert!(stats.contains("Last broadcast: never"));
    }

    /// Menu labels leave active flows; free text does not
    #[test]
    fn test_menu_label_detection() {
        assert!(is_menu_label(MAIN_MENU_HELP));
        assert!(is_menu_label(INVENTORY_SUBMENU_INPUT));
        assert!(!is_menu_label("Secret1 Secret2"));
    }

    /// The dispatcher schema and shared context can be built without a network
    #[test]
    fn test_context_and_schema_build() {
        let dir = tempfile::tempdir().unwrap();
        let access = AccessStore::open(dir.path().join("bot_data.json"), AdminIds::parse("1"))
            .unwrap();
        let ctx = BotContext::new(access, Arc::new(InMemoryInventoryStore::new()));
        assert!(ctx.access.is_admin(1));

        let _handler = schema();
    }
}
