//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyMarkup};
use teloxide::utils::html::escape;
use tracing::{debug, info};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::credential_parser::looks_like_instant_payload;
use crate::dialogue::{is_reset_text, DocDialogue, DocDialogueState, MENU_RESTART};

// Import dialogue manager functions
use super::admin_handler::{handle_admin_input, open_admin_menu};
use super::dialogue_manager::{
    handle_document_filename, handle_instant_payload, handle_inventory_cookie,
    handle_inventory_filename, handle_inventory_password, handle_manual_input,
    start_inventory_export,
};

// Import UI builder functions
use super::ui_builder::{
    create_doc_keyboard, describe_access_decision, format_inventory_info, inline_cancel_keyboard,
    inventory_keyboard, is_menu_label, main_menu_keyboard, CB_CANCEL_INPUT, CB_INVENTORY_CANCEL,
    INVENTORY_SUBMENU_INFO, INVENTORY_SUBMENU_INPUT, INVENTORY_SUBMENU_START, MAIN_MENU_ADMIN,
    MAIN_MENU_CREATE_DOC, MAIN_MENU_HELP, MAIN_MENU_INVENTORY, SUBMENU_BACK, SUBMENU_INSTANT,
    SUBMENU_MANUAL,
};
use super::SharedContext;

/// Telegram language code of the sender, if any
pub(crate) fn language_of(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str())
}

pub(crate) fn sender_id(msg: &Message) -> Option<u64> {
    msg.from.as_ref().map(|user| user.id.0)
}

/// Send an HTML message with the given keyboard
pub(crate) async fn reply_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    markup: impl Into<ReplyMarkup>,
) -> Result<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(markup)
        .await?;
    Ok(())
}

/// Show the main menu, with the admin row for admins
pub(crate) async fn send_main_menu(
    bot: &Bot,
    chat_id: ChatId,
    ctx: &SharedContext,
    user_id: Option<u64>,
    text: String,
) -> Result<()> {
    let is_admin = user_id.is_some_and(|id| ctx.access.is_admin(id));
    reply_html(bot, chat_id, text, main_menu_keyboard(is_admin)).await
}

/// Run the access guard; on denial, explain why and show the main menu
pub(crate) async fn ensure_access(
    bot: &Bot,
    msg: &Message,
    ctx: &SharedContext,
    language_code: Option<&str>,
) -> Result<bool> {
    let Some(user_id) = sender_id(msg) else {
        return Ok(false);
    };

    let decision = ctx.access.guard(user_id).await?;
    if decision.is_granted() {
        return Ok(true);
    }

    send_main_menu(
        bot,
        msg.chat.id,
        ctx,
        Some(user_id),
        describe_access_decision(decision, language_code),
    )
    .await?;
    Ok(false)
}

async fn send_welcome(
    bot: &Bot,
    msg: &Message,
    ctx: &SharedContext,
    language_code: Option<&str>,
) -> Result<()> {
    let name = msg
        .from
        .as_ref()
        .map(|user| escape(&user.first_name))
        .unwrap_or_default();
    let text = t_args_lang("welcome", &[("name", &name)], language_code);
    send_main_menu(bot, msg.chat.id, ctx, sender_id(msg), text).await
}

/// Top-level routing for menu labels, commands and instant payloads
async fn route_idle_text(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let user_id = sender_id(msg);

    match text {
        "/help" | MAIN_MENU_HELP => {
            send_main_menu(bot, chat_id, ctx, user_id, t_lang("help-text", language_code)).await
        }
        SUBMENU_BACK => {
            send_main_menu(bot, chat_id, ctx, user_id, t_lang("back-to-main", language_code))
                .await
        }
        "/buat" | MAIN_MENU_CREATE_DOC => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            reply_html(
                bot,
                chat_id,
                t_lang("create-doc-menu", language_code),
                create_doc_keyboard(),
            )
            .await
        }
        "/manual" | SUBMENU_MANUAL => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            reply_html(
                bot,
                chat_id,
                t_lang("manual-ask-uids", language_code),
                inline_cancel_keyboard(CB_CANCEL_INPUT, language_code),
            )
            .await?;
            dialogue.update(DocDialogueState::AwaitingUids).await?;
            info!(user_id = %chat_id, "Manual input started");
            Ok(())
        }
        "/instan" | SUBMENU_INSTANT => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            reply_html(
                bot,
                chat_id,
                t_lang("instant-prompt", language_code),
                inline_cancel_keyboard(CB_CANCEL_INPUT, language_code),
            )
            .await?;
            dialogue
                .update(DocDialogueState::AwaitingInstantPayload)
                .await?;
            Ok(())
        }
        "/inventori" | MAIN_MENU_INVENTORY => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            reply_html(
                bot,
                chat_id,
                t_lang("inventory-menu", language_code),
                inventory_keyboard(),
            )
            .await
        }
        INVENTORY_SUBMENU_INPUT => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            reply_html(
                bot,
                chat_id,
                t_lang("inventory-ask-cookie", language_code),
                inline_cancel_keyboard(CB_INVENTORY_CANCEL, language_code),
            )
            .await?;
            dialogue
                .update(DocDialogueState::InventoryAwaitingCookie)
                .await?;
            Ok(())
        }
        INVENTORY_SUBMENU_INFO => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            let owner = chat_id.0;
            let count = ctx.inventory.count(owner).await?;
            let meta = ctx.inventory.meta(owner).await?;
            reply_html(
                bot,
                chat_id,
                format_inventory_info(count, &meta, language_code),
                inventory_keyboard(),
            )
            .await
        }
        INVENTORY_SUBMENU_START => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            start_inventory_export(bot, msg, dialogue, ctx, language_code).await
        }
        "/admin" | MAIN_MENU_ADMIN => open_admin_menu(bot, msg, dialogue, ctx, language_code).await,
        _ if looks_like_instant_payload(text) => {
            if !ensure_access(bot, msg, ctx, language_code).await? {
                return Ok(());
            }
            debug!(user_id = %chat_id, "Instant payload auto-detected");
            handle_instant_payload(bot, msg, dialogue, text, language_code).await
        }
        _ => {
            send_main_menu(bot, chat_id, ctx, user_id, t_lang("unknown-input", language_code))
                .await
        }
    }
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    text: &str,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Extract user's language code from Telegram
    let language_code = language_of(msg);
    let trimmed = text.trim();

    if is_reset_text(trimmed) {
        dialogue.exit().await?;
        return if matches!(trimmed, "/start" | "Start" | MENU_RESTART) {
            send_welcome(bot, msg, ctx, language_code).await
        } else {
            send_main_menu(
                bot,
                msg.chat.id,
                ctx,
                sender_id(msg),
                t_lang("session-cancelled", language_code),
            )
            .await
        };
    }

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %msg.chat.id, dialogue_state = ?state, "Retrieved dialogue state");

    // Menu buttons and commands abandon any active flow
    if state != DocDialogueState::Idle && (is_menu_label(trimmed) || trimmed.starts_with('/')) {
        debug!(user_id = %msg.chat.id, "Leaving active flow for menu selection");
        dialogue.exit().await?;
        return route_idle_text(bot, msg, dialogue, ctx, trimmed, language_code).await;
    }

    match state {
        DocDialogueState::Idle => {
            route_idle_text(bot, msg, dialogue, ctx, trimmed, language_code).await
        }
        DocDialogueState::AwaitingUids
        | DocDialogueState::AwaitingPasswords { .. }
        | DocDialogueState::AwaitingCookies { .. } => {
            handle_manual_input(bot, msg, dialogue, ctx, &state, text, language_code).await
        }
        DocDialogueState::AwaitingInstantPayload => {
            handle_instant_payload(bot, msg, dialogue, text, language_code).await
        }
        DocDialogueState::AwaitingFilename { triple } => {
            handle_document_filename(bot, msg, dialogue, ctx, triple, trimmed, language_code).await
        }
        DocDialogueState::InventoryAwaitingCookie => {
            handle_inventory_cookie(bot, msg, dialogue, trimmed, language_code).await
        }
        DocDialogueState::InventoryAwaitingPassword { uid, cookie } => {
            handle_inventory_password(
                bot,
                msg,
                dialogue,
                ctx,
                &uid,
                &cookie,
                trimmed,
                language_code,
            )
            .await
        }
        DocDialogueState::InventoryAwaitingFilename => {
            handle_inventory_filename(bot, msg, dialogue, ctx, trimmed, language_code).await
        }
        DocDialogueState::AdminMenu
        | DocDialogueState::AdminAwaitingWhitelist
        | DocDialogueState::AdminAwaitingDuration
        | DocDialogueState::AdminAwaitingBlock
        | DocDialogueState::AdminAwaitingBroadcast => {
            handle_admin_input(bot, msg, dialogue, ctx, state, text, language_code).await
        }
    }
}

async fn handle_unsupported_message(
    bot: &Bot,
    msg: &Message,
    ctx: &SharedContext,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
    send_main_menu(
        bot,
        msg.chat.id,
        ctx,
        sender_id(msg),
        t_lang("unsupported-message", language_of(msg)),
    )
    .await
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: DocDialogue,
    ctx: SharedContext,
) -> Result<()> {
    match msg.text() {
        Some(text) => handle_text_message(&bot, &msg, dialogue, &ctx, text).await,
        None => handle_unsupported_message(&bot, &msg, &ctx).await,
    }
}
