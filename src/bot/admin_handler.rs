//! Admin panel: whitelist, access duration, block list, broadcast and stats

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::UserId;
use tracing::{debug, info, warn};

use crate::access::{parse_duration_input, parse_user_id, AccessError};
use crate::dialogue::{DocDialogue, DocDialogueState};
use crate::localization::{t_args_lang, t_lang};

use super::message_handler::{reply_html, send_main_menu, sender_id};
use super::ui_builder::{
    admin_keyboard, describe_access_error, format_stats, format_timestamp, ADMIN_MENU_BLOCK,
    ADMIN_MENU_BROADCAST, ADMIN_MENU_DURATION, ADMIN_MENU_STATS, ADMIN_MENU_WHITELIST,
};
use super::SharedContext;

fn is_admin(ctx: &SharedContext, msg: &Message) -> bool {
    sender_id(msg).is_some_and(|id| ctx.access.is_admin(id))
}

fn is_admin_label(text: &str) -> bool {
    matches!(
        text,
        ADMIN_MENU_WHITELIST
            | ADMIN_MENU_DURATION
            | ADMIN_MENU_BLOCK
            | ADMIN_MENU_BROADCAST
            | ADMIN_MENU_STATS
    )
}

async fn deny(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    language_code: Option<&str>,
) -> Result<()> {
    warn!(user_id = %msg.chat.id, "Non-admin tried to use the admin panel");
    dialogue.exit().await?;
    send_main_menu(
        bot,
        msg.chat.id,
        ctx,
        sender_id(msg),
        t_lang("admin-only", language_code),
    )
    .await
}

/// Reply in the admin menu and return to it
async fn back_to_admin_menu(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: DocDialogue,
    text: String,
) -> Result<()> {
    dialogue.update(DocDialogueState::AdminMenu).await?;
    reply_html(bot, chat_id, text, admin_keyboard()).await
}

pub async fn open_admin_menu(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    language_code: Option<&str>,
) -> Result<()> {
    if !is_admin(ctx, msg) {
        return deny(bot, msg, dialogue, ctx, language_code).await;
    }
    back_to_admin_menu(bot, msg.chat.id, dialogue, t_lang("admin-menu", language_code)).await
}

/// Send `text` to every broadcast target, returning (delivered, failed)
pub async fn broadcast(bot: &Bot, ctx: &SharedContext, text: &str) -> Result<(usize, usize)> {
    let targets = ctx.access.broadcast_targets().await;
    let mut delivered = 0;
    let mut failed = 0;

    for target in targets {
        match bot.send_message(ChatId::from(UserId(target)), text).await {
            Ok(_) => delivered += 1,
            Err(e) => {
                warn!(user_id = target, error = %e, "Broadcast delivery failed");
                failed += 1;
            }
        }
    }

    ctx.access.record_broadcast().await?;
    info!(delivered, failed, "Broadcast finished");
    Ok((delivered, failed))
}

async fn handle_menu_selection(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let (next, prompt) = match text {
        ADMIN_MENU_WHITELIST => (
            DocDialogueState::AdminAwaitingWhitelist,
            "admin-ask-whitelist",
        ),
        ADMIN_MENU_DURATION => (
            DocDialogueState::AdminAwaitingDuration,
            "admin-ask-duration",
        ),
        ADMIN_MENU_BLOCK => (DocDialogueState::AdminAwaitingBlock, "admin-ask-block"),
        ADMIN_MENU_BROADCAST => (
            DocDialogueState::AdminAwaitingBroadcast,
            "admin-ask-broadcast",
        ),
        ADMIN_MENU_STATS => {
            let summary = ctx.access.summary().await;
            return back_to_admin_menu(bot, chat_id, dialogue, format_stats(&summary, language_code))
                .await;
        }
        _ => {
            return back_to_admin_menu(bot, chat_id, dialogue, t_lang("admin-menu", language_code))
                .await;
        }
    };

    dialogue.update(next).await?;
    reply_html(bot, chat_id, t_lang(prompt, language_code), admin_keyboard()).await
}

/// Invalid input keeps the prompt open
async fn reject_input(
    bot: &Bot,
    chat_id: ChatId,
    err: &AccessError,
    language_code: Option<&str>,
) -> Result<()> {
    reply_html(bot, chat_id, describe_access_error(err, language_code), admin_keyboard()).await
}

/// Route text received while the admin panel is open
pub async fn handle_admin_input(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    state: DocDialogueState,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if !is_admin(ctx, msg) {
        return deny(bot, msg, dialogue, ctx, language_code).await;
    }

    let chat_id = msg.chat.id;
    let input = text.trim();
    debug!(user_id = %chat_id, admin_state = ?state, "Admin input received");

    // Admin buttons switch action even while a prompt is open
    if is_admin_label(input) {
        return handle_menu_selection(bot, msg, dialogue, ctx, input, language_code).await;
    }

    match state {
        DocDialogueState::AdminAwaitingWhitelist => {
            let user_id = match parse_user_id(input) {
                Ok(user_id) => user_id,
                Err(e) => return reject_input(bot, chat_id, &e, language_code).await,
            };
            let whitelisted = ctx.access.toggle_whitelist(user_id).await?;
            let key = if whitelisted {
                "admin-whitelist-added"
            } else {
                "admin-whitelist-removed"
            };
            let reply = t_args_lang(key, &[("user_id", &user_id.to_string())], language_code);
            back_to_admin_menu(bot, chat_id, dialogue, reply).await
        }
        DocDialogueState::AdminAwaitingDuration => {
            let (user_id, days) = match parse_duration_input(input) {
                Ok(parsed) => parsed,
                Err(e) => return reject_input(bot, chat_id, &e, language_code).await,
            };
            let reply = match ctx.access.grant_for_days(user_id, days).await? {
                Some(expires) => t_args_lang(
                    "admin-duration-set",
                    &[
                        ("user_id", &user_id.to_string()),
                        ("expires", &format_timestamp(Some(expires), language_code)),
                    ],
                    language_code,
                ),
                None => t_args_lang(
                    "admin-duration-permanent",
                    &[("user_id", &user_id.to_string())],
                    language_code,
                ),
            };
            back_to_admin_menu(bot, chat_id, dialogue, reply).await
        }
        DocDialogueState::AdminAwaitingBlock => {
            let user_id = match parse_user_id(input) {
                Ok(user_id) => user_id,
                Err(e) => return reject_input(bot, chat_id, &e, language_code).await,
            };
            let blocked = ctx.access.toggle_block(user_id).await?;
            let key = if blocked {
                "admin-blocked"
            } else {
                "admin-unblocked"
            };
            let reply = t_args_lang(key, &[("user_id", &user_id.to_string())], language_code);
            back_to_admin_menu(bot, chat_id, dialogue, reply).await
        }
        DocDialogueState::AdminAwaitingBroadcast => {
            if input.is_empty() {
                reply_html(
                    bot,
                    chat_id,
                    t_lang("admin-broadcast-empty", language_code),
                    admin_keyboard(),
                )
                .await?;
                return Ok(());
            }
            let (delivered, failed) = broadcast(bot, ctx, input).await?;
            let reply = t_args_lang(
                "admin-broadcast-done",
                &[
                    ("delivered", &delivered.to_string()),
                    ("failed", &failed.to_string()),
                ],
                language_code,
            );
            back_to_admin_menu(bot, chat_id, dialogue, reply).await
        }
        _ => handle_menu_selection(bot, msg, dialogue, ctx, input, language_code).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ui_builder::{MAIN_MENU_HELP, SUBMENU_BACK};

    #[test]
    fn test_admin_labels() {
        assert!(is_admin_label(ADMIN_MENU_WHITELIST));
        assert!(is_admin_label(ADMIN_MENU_STATS));
        assert!(!is_admin_label(SUBMENU_BACK));
        assert!(!is_admin_label(MAIN_MENU_HELP));
        assert!(!is_admin_label("123456789 30"));
    }
}
