//! UI Builder module for creating keyboards and formatting messages

use chrono::{DateTime, Utc};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use teloxide::utils::html::escape;

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::access::{AccessDecision, AccessError, StatsSummary};
use crate::dialogue::MENU_RESTART;
use crate::errors::{CookieRule, Field, ValidationError};
use crate::inventory::{InventoryError, InventoryMeta};

pub const MAIN_MENU_CREATE_DOC: &str = "📝 Create Excel Document";
pub const MAIN_MENU_INVENTORY: &str = "📦 Inventory";
pub const MAIN_MENU_HELP: &str = "ℹ️ Help";
pub const MAIN_MENU_ADMIN: &str = "🛡️ Admin Panel";

pub const SUBMENU_MANUAL: &str = "⌨️ Manual Input";
pub const SUBMENU_INSTANT: &str = "⚡ Instant Input";
pub const SUBMENU_BACK: &str = "🔙 Back";

pub const INVENTORY_SUBMENU_INPUT: &str = "➕ Add Account";
pub const INVENTORY_SUBMENU_INFO: &str = "📊 Inventory Info";
pub const INVENTORY_SUBMENU_START: &str = "🚀 Export Inventory";

pub const ADMIN_MENU_WHITELIST: &str = "✅ Manage Whitelist";
pub const ADMIN_MENU_DURATION: &str = "⏳ Access Duration";
pub const ADMIN_MENU_BLOCK: &str = "⛔ Block User";
pub const ADMIN_MENU_BROADCAST: &str = "📣 Broadcast";
pub const ADMIN_MENU_STATS: &str = "📈 Statistics";

pub const CB_CANCEL_INPUT: &str = "cancel_input";
pub const CB_INVENTORY_CANCEL: &str = "inv_cancel_input";
pub const CB_INVENTORY_SKIP_PASSWORD: &str = "inv_skip_password";

/// Labels that leave whatever flow is active and are routed from the idle state
pub fn is_menu_label(text: &str) -> bool {
    matches!(
        text,
        MAIN_MENU_CREATE_DOC
            | MAIN_MENU_INVENTORY
            | MAIN_MENU_HELP
            | MAIN_MENU_ADMIN
            | SUBMENU_MANUAL
            | SUBMENU_INSTANT
            | SUBMENU_BACK
            | INVENTORY_SUBMENU_INPUT
            | INVENTORY_SUBMENU_INFO
            | INVENTORY_SUBMENU_START
    )
}

fn reply_keyboard(rows: Vec<Vec<&str>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
    .resize_keyboard()
}

pub fn main_menu_keyboard(is_admin: bool) -> KeyboardMarkup {
    let mut rows = vec![
        vec![MAIN_MENU_CREATE_DOC],
        vec![MAIN_MENU_INVENTORY],
        vec![MENU_RESTART, MAIN_MENU_HELP],
    ];
    if is_admin {
        rows.push(vec![MAIN_MENU_ADMIN]);
    }
    reply_keyboard(rows)
}

pub fn create_doc_keyboard() -> KeyboardMarkup {
    reply_keyboard(vec![vec![SUBMENU_MANUAL, SUBMENU_INSTANT], vec![SUBMENU_BACK]])
}

pub fn inventory_keyboard() -> KeyboardMarkup {
    reply_keyboard(vec![
        vec![INVENTORY_SUBMENU_INPUT, INVENTORY_SUBMENU_INFO],
        vec![INVENTORY_SUBMENU_START, SUBMENU_BACK],
    ])
}

pub fn admin_keyboard() -> KeyboardMarkup {
    reply_keyboard(vec![
        vec![ADMIN_MENU_WHITELIST, ADMIN_MENU_DURATION],
        vec![ADMIN_MENU_BLOCK, ADMIN_MENU_BROADCAST],
        vec![ADMIN_MENU_STATS, SUBMENU_BACK],
    ])
}

/// Inline cancel button shown under prompts of an active flow
pub fn inline_cancel_keyboard(callback_data: &str, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("❌ {}", t_lang("button-cancel", language_code)),
        callback_data.to_string(),
    )]])
}

pub fn skip_password_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("⏭️ {}", t_lang("button-skip-password", language_code)),
            CB_INVENTORY_SKIP_PASSWORD.to_string(),
        )],
        vec![InlineKeyboardButton::callback(
            format!("❌ {}", t_lang("button-cancel", language_code)),
            CB_INVENTORY_CANCEL.to_string(),
        )],
    ])
}

fn field_name(field: Field, language_code: Option<&str>) -> String {
    match field {
        Field::Uid => t_lang("field-uid", language_code),
        Field::Password => t_lang("field-password", language_code),
        Field::Cookie => t_lang("field-cookie", language_code),
    }
}

fn cookie_rule_reason(rule: CookieRule, language_code: Option<&str>) -> String {
    let key = match rule {
        CookieRule::Empty => "cookie-rule-empty",
        CookieRule::TooShort => "cookie-rule-too-short",
        CookieRule::MissingRequiredKeys => "cookie-rule-missing-keys",
        CookieRule::MalformedPairs => "cookie-rule-malformed",
    };
    t_lang(key, language_code)
}

/// One human-readable message naming the violated rule and, where known, the element
pub fn describe_validation_error(error: &ValidationError, language_code: Option<&str>) -> String {
    match error {
        ValidationError::EmptyField { field } => t_args_lang(
            "error-empty-field",
            &[("field", &field_name(*field, language_code))],
            language_code,
        ),
        ValidationError::InvalidFormat {
            field: Field::Uid,
            index,
            value,
            ..
        } => t_args_lang(
            "error-invalid-uid",
            &[("index", &index.to_string()), ("value", &escape(value))],
            language_code,
        ),
        ValidationError::InvalidFormat {
            field: Field::Password,
            index,
            ..
        } => t_args_lang(
            "error-invalid-password",
            &[("index", &index.to_string())],
            language_code,
        ),
        ValidationError::InvalidFormat {
            field: Field::Cookie,
            index,
            rule,
            ..
        } => {
            let reason = rule
                .map(|rule| cookie_rule_reason(rule, language_code))
                .unwrap_or_default();
            t_args_lang(
                "error-invalid-cookie",
                &[("index", &index.to_string()), ("reason", &reason)],
                language_code,
            )
        }
        ValidationError::CountMismatch {
            uids,
            passwords,
            cookies: Some(cookies),
        } => t_args_lang(
            "error-count-mismatch",
            &[
                ("uids", &uids.to_string()),
                ("passwords", &passwords.to_string()),
                ("cookies", &cookies.to_string()),
            ],
            language_code,
        ),
        ValidationError::CountMismatch {
            uids,
            passwords,
            cookies: None,
        } => t_args_lang(
            "error-password-count-mismatch",
            &[
                ("uids", &uids.to_string()),
                ("passwords", &passwords.to_string()),
            ],
            language_code,
        ),
        ValidationError::InsufficientLines { .. } => {
            t_lang("error-insufficient-lines", language_code)
        }
        ValidationError::MissingDelimiter => t_lang("error-missing-delimiter", language_code),
        ValidationError::InvalidFilename => t_lang("error-invalid-filename", language_code),
    }
}

pub fn describe_inventory_error(error: &InventoryError, language_code: Option<&str>) -> String {
    let key = match error {
        InventoryError::MissingCUser => "inventory-error-missing-c-user",
        InventoryError::MissingXs => "inventory-error-missing-xs",
        InventoryError::UidNotDetected => "inventory-error-uid-not-detected",
        InventoryError::InvalidPassword => "inventory-error-password",
    };
    t_lang(key, language_code)
}

pub fn describe_access_decision(decision: AccessDecision, language_code: Option<&str>) -> String {
    match decision {
        AccessDecision::Granted => String::new(),
        AccessDecision::Blocked => t_lang("access-blocked", language_code),
        AccessDecision::NotWhitelisted => t_lang("access-not-whitelisted", language_code),
        AccessDecision::Expired => t_lang("access-expired", language_code),
    }
}

pub fn describe_access_error(error: &AccessError, language_code: Option<&str>) -> String {
    match error {
        AccessError::InvalidUserId => t_lang("admin-invalid-user-id", language_code),
        AccessError::InvalidDuration => t_lang("admin-invalid-duration", language_code),
    }
}

pub fn format_timestamp(time: Option<DateTime<Utc>>, language_code: Option<&str>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| t_lang("never", language_code))
}

pub fn format_inventory_info(
    count: usize,
    meta: &InventoryMeta,
    language_code: Option<&str>,
) -> String {
    let password_status = if meta.last_password_empty {
        t_lang("inventory-password-absent", language_code)
    } else {
        t_lang("inventory-password-present", language_code)
    };
    t_args_lang(
        "inventory-info",
        &[
            ("count", &count.to_string()),
            ("uid", &escape(&meta.last_uid)),
            ("password_status", &password_status),
            ("time", &format_timestamp(meta.last_input_at, language_code)),
        ],
        language_code,
    )
}

pub fn format_stats(summary: &StatsSummary, language_code: Option<&str>) -> String {
    t_args_lang(
        "admin-stats",
        &[
            ("users", &summary.total_users.to_string()),
            ("whitelisted", &summary.active_whitelisted.to_string()),
            ("blocked", &summary.blocked.to_string()),
            ("docs", &summary.total_docs_created.to_string()),
            ("messages", &summary.total_messages_processed.to_string()),
            (
                "last_broadcast",
                &format_timestamp(summary.last_broadcast_at, language_code),
            ),
        ],
        language_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_admin_row() {
        assert_eq!(main_menu_keyboard(false).keyboard.len(), 3);
        assert_eq!(main_menu_keyboard(true).keyboard.len(), 4);
    }

    #[test]
    fn test_menu_labels() {
        assert!(is_menu_label(SUBMENU_BACK));
        assert!(is_menu_label(INVENTORY_SUBMENU_START));
        assert!(!is_menu_label(ADMIN_MENU_STATS));
        assert!(!is_menu_label("12345678 87654321"));
    }

    #[test]
    fn test_describe_uid_error_mentions_value() {
        let message = describe_validation_error(
            &ValidationError::InvalidFormat {
                field: Field::Uid,
                index: 1,
                value: "abc".to_string(),
                rule: None,
            },
            Some("en"),
        );
        assert!(message.contains("abc"));
        assert!(message.contains('1'));
    }
}
