//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MessageId};
use tracing::{debug, warn};

// Import localization
use crate::localization::t_lang;

// Import dialogue types
use crate::dialogue::{DocDialogue, DocDialogueState};

use super::dialogue_manager::store_inventory_entry;
use super::message_handler::{reply_html, send_main_menu};
use super::ui_builder::{
    inventory_keyboard, CB_CANCEL_INPUT, CB_INVENTORY_CANCEL, CB_INVENTORY_SKIP_PASSWORD,
};
use super::SharedContext;

/// Remove the inline buttons from a prompt so they cannot be pressed twice
async fn clear_inline_keyboard(bot: &Bot, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.edit_message_reply_markup(chat_id, message_id).await {
        debug!(user_id = %chat_id, error = %e, "Could not clear inline keyboard");
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: DocDialogue,
    ctx: SharedContext,
) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    let language_code = q.from.language_code.as_deref();
    let data = q.data.as_deref().unwrap_or("");

    let Some(msg) = &q.message else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;

    let dialogue_state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %q.from.id, dialogue_state = ?dialogue_state, data, "Retrieved dialogue state");

    match data {
        CB_CANCEL_INPUT => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("callback-cancelled", language_code))
                .await?;
            dialogue.exit().await?;
            clear_inline_keyboard(&bot, chat_id, msg.id()).await;
            send_main_menu(
                &bot,
                chat_id,
                &ctx,
                Some(q.from.id.0),
                t_lang("session-cancelled", language_code),
            )
            .await?;
        }
        CB_INVENTORY_CANCEL => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("callback-cancelled", language_code))
                .await?;
            dialogue.exit().await?;
            clear_inline_keyboard(&bot, chat_id, msg.id()).await;
            reply_html(
                &bot,
                chat_id,
                t_lang("inventory-input-cancelled", language_code),
                inventory_keyboard(),
            )
            .await?;
        }
        CB_INVENTORY_SKIP_PASSWORD => match dialogue_state {
            DocDialogueState::InventoryAwaitingPassword { uid, cookie } => {
                bot.answer_callback_query(q.id.clone())
                    .text(t_lang("password-skipped", language_code))
                    .await?;
                clear_inline_keyboard(&bot, chat_id, msg.id()).await;
                store_inventory_entry(&bot, chat_id, dialogue, &ctx, &uid, "", &cookie, language_code)
                    .await?;
            }
            _ => {
                // Button left over from a finished prompt
                warn!(user_id = %q.from.id, "Skip password pressed outside the password step");
                bot.answer_callback_query(q.id.clone()).await?;
                clear_inline_keyboard(&bot, chat_id, msg.id()).await;
            }
        },
        _ => {
            debug!(user_id = %q.from.id, data, "Unknown callback data");
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}
