//! Dialogue Manager module for the document and inventory flow steps

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::credential_parser::{parse_instant, CredentialRecord, CredentialTriple};
use crate::dialogue::{advance_manual, DocDialogue, DocDialogueState, ManualStep};
use crate::inventory::{accept_inventory_cookie, validate_inventory_password};
use crate::xlsx_export::{
    export_records, ExportDocument, ExportError, DOCUMENT_FILENAME_PREFIX, DOCUMENT_SHEET_NAME,
    INVENTORY_FILENAME_PREFIX, INVENTORY_SHEET_NAME,
};

// Import UI builder functions
use super::message_handler::{reply_html, send_main_menu, sender_id};
use super::ui_builder::{
    create_doc_keyboard, describe_inventory_error, describe_validation_error,
    inline_cancel_keyboard, inventory_keyboard, skip_password_keyboard, CB_CANCEL_INPUT,
    CB_INVENTORY_CANCEL,
};
use super::SharedContext;

/// Prompt shown after a manual step moved the flow forward
fn prompt_for(next: &DocDialogueState, language_code: Option<&str>) -> String {
    match next {
        DocDialogueState::AwaitingPasswords { uids } => t_args_lang(
            "manual-uids-accepted",
            &[("count", &uids.len().to_string())],
            language_code,
        ),
        DocDialogueState::AwaitingCookies { .. } => {
            t_lang("manual-passwords-accepted", language_code)
        }
        DocDialogueState::AwaitingFilename { triple } => ask_filename(triple, language_code),
        _ => t_lang("back-to-main", language_code),
    }
}

fn ask_filename(triple: &CredentialTriple, language_code: Option<&str>) -> String {
    t_args_lang(
        "ask-filename",
        &[("count", &triple.len().to_string())],
        language_code,
    )
}

/// Handle one message of the manual UID, password, cookie sequence
pub async fn handle_manual_input(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    state: &DocDialogueState,
    input: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match advance_manual(state, input) {
        ManualStep::Advance(next) => {
            debug!(user_id = %chat_id, next_state = ?next, "Manual input accepted");
            reply_html(
                bot,
                chat_id,
                prompt_for(&next, language_code),
                inline_cancel_keyboard(CB_CANCEL_INPUT, language_code),
            )
            .await?;
            dialogue.update(next).await?;
        }
        ManualStep::Rejected(e) => {
            debug!(user_id = %chat_id, error = %e, "Manual input rejected");
            reply_html(
                bot,
                chat_id,
                describe_validation_error(&e, language_code),
                inline_cancel_keyboard(CB_CANCEL_INPUT, language_code),
            )
            .await?;
            // Keep dialogue active, user can try again
        }
        ManualStep::Reset | ManualStep::NotApplicable => {
            dialogue.exit().await?;
            send_main_menu(
                bot,
                chat_id,
                ctx,
                sender_id(msg),
                t_lang("session-cancelled", language_code),
            )
            .await?;
        }
    }

    Ok(())
}

/// Parse a three-line instant payload; failures end the flow
pub async fn handle_instant_payload(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match parse_instant(text) {
        Ok(triple) => {
            info!(user_id = %chat_id, records = triple.len(), "Instant payload parsed");
            reply_html(
                bot,
                chat_id,
                ask_filename(&triple, language_code),
                inline_cancel_keyboard(CB_CANCEL_INPUT, language_code),
            )
            .await?;
            dialogue
                .update(DocDialogueState::AwaitingFilename { triple })
                .await?;
        }
        Err(e) => {
            debug!(user_id = %chat_id, error = %e, "Instant payload rejected");
            dialogue.exit().await?;
            reply_html(
                bot,
                chat_id,
                describe_validation_error(&e, language_code),
                create_doc_keyboard(),
            )
            .await?;
        }
    }

    Ok(())
}

/// Send a rendered workbook as a document
async fn send_export(
    bot: &Bot,
    chat_id: ChatId,
    document: ExportDocument,
    caption: String,
) -> Result<()> {
    let size = document.bytes.len();
    let file = InputFile::memory(document.bytes).file_name(document.filename.clone());
    bot.send_document(chat_id, file).caption(caption).await?;
    info!(user_id = %chat_id, filename = %document.filename, bytes = size, "Document sent");
    Ok(())
}

/// Count a delivered document; stats failures never reach the user
async fn record_document(ctx: &SharedContext, msg: &Message) {
    if let Some(user_id) = sender_id(msg) {
        if let Err(e) = ctx.access.record_document(user_id).await {
            warn!(user_id, error = %e, "Failed to record document stats");
        }
    }
}

/// Reply to an export failure; the flow stays on the filename step
async fn report_export_error(
    bot: &Bot,
    chat_id: ChatId,
    err: &ExportError,
    cancel_callback: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let text = match err {
        ExportError::Validation(e) => describe_validation_error(e, language_code),
        ExportError::Render(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to render spreadsheet");
            t_lang("render-failed", language_code)
        }
    };
    reply_html(
        bot,
        chat_id,
        text,
        inline_cancel_keyboard(cancel_callback, language_code),
    )
    .await
}

/// Final step of the document flows: validate the name, render and send
pub async fn handle_document_filename(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    triple: CredentialTriple,
    raw_filename: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match export_records(
        raw_filename,
        DOCUMENT_FILENAME_PREFIX,
        DOCUMENT_SHEET_NAME,
        &triple.records(),
    ) {
        Ok(document) => {
            let caption = t_args_lang(
                "document-caption",
                &[("count", &triple.len().to_string())],
                language_code,
            );
            send_export(bot, chat_id, document, caption).await?;
            record_document(ctx, msg).await;
            dialogue.exit().await?;
            send_main_menu(
                bot,
                chat_id,
                ctx,
                sender_id(msg),
                t_lang("back-to-main", language_code),
            )
            .await?;
        }
        Err(e) => {
            // Keep dialogue active, user can send another name
            report_export_error(bot, chat_id, &e, CB_CANCEL_INPUT, language_code).await?;
        }
    }

    Ok(())
}

pub async fn handle_inventory_cookie(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    cookie: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match accept_inventory_cookie(cookie) {
        Ok(uid) => {
            debug!(user_id = %chat_id, uid = %uid, "Inventory cookie accepted");
            reply_html(
                bot,
                chat_id,
                t_args_lang("inventory-cookie-accepted", &[("uid", &uid)], language_code),
                skip_password_keyboard(language_code),
            )
            .await?;
            dialogue
                .update(DocDialogueState::InventoryAwaitingPassword {
                    uid,
                    cookie: cookie.to_string(),
                })
                .await?;
        }
        Err(e) => {
            reply_html(
                bot,
                chat_id,
                describe_inventory_error(&e, language_code),
                inline_cancel_keyboard(CB_INVENTORY_CANCEL, language_code),
            )
            .await?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_inventory_password(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    uid: &str,
    cookie: &str,
    password: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if let Err(e) = validate_inventory_password(password) {
        reply_html(
            bot,
            msg.chat.id,
            describe_inventory_error(&e, language_code),
            skip_password_keyboard(language_code),
        )
        .await?;
        return Ok(());
    }

    store_inventory_entry(bot, msg.chat.id, dialogue, ctx, uid, password, cookie, language_code)
        .await
}

/// Stage one account and return to the inventory menu; an empty password means skipped
#[allow(clippy::too_many_arguments)]
pub async fn store_inventory_entry(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    uid: &str,
    password: &str,
    cookie: &str,
    language_code: Option<&str>,
) -> Result<()> {
    dialogue.exit().await?;

    if let Err(e) = ctx.inventory.add_entry(chat_id.0, uid, password, cookie).await {
        error!(user_id = %chat_id, error = %e, "Failed to store inventory entry");
        reply_html(
            bot,
            chat_id,
            t_lang("storage-failed", language_code),
            inventory_keyboard(),
        )
        .await?;
        return Ok(());
    }

    let count = ctx.inventory.count(chat_id.0).await?;
    info!(user_id = %chat_id, uid = %uid, total = count, "Inventory entry added");

    let key = if password.is_empty() {
        "inventory-entry-added-no-password"
    } else {
        "inventory-entry-added"
    };
    reply_html(
        bot,
        chat_id,
        t_args_lang(key, &[("uid", uid), ("count", &count.to_string())], language_code),
        inventory_keyboard(),
    )
    .await
}

/// Ask for the export file name, refusing an empty inventory
pub async fn start_inventory_export(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let count = ctx.inventory.count(chat_id.0).await?;

    if count == 0 {
        reply_html(
            bot,
            chat_id,
            t_lang("inventory-empty", language_code),
            inventory_keyboard(),
        )
        .await?;
        return Ok(());
    }

    reply_html(
        bot,
        chat_id,
        t_args_lang(
            "inventory-ask-filename",
            &[("count", &count.to_string())],
            language_code,
        ),
        inline_cancel_keyboard(CB_INVENTORY_CANCEL, language_code),
    )
    .await?;
    dialogue
        .update(DocDialogueState::InventoryAwaitingFilename)
        .await?;
    Ok(())
}

/// Render every staged account, send the workbook and clear the inventory
pub async fn handle_inventory_filename(
    bot: &Bot,
    msg: &Message,
    dialogue: DocDialogue,
    ctx: &SharedContext,
    raw_filename: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let entries = ctx.inventory.entries(chat_id.0).await?;

    if entries.is_empty() {
        dialogue.exit().await?;
        reply_html(
            bot,
            chat_id,
            t_lang("inventory-empty", language_code),
            inventory_keyboard(),
        )
        .await?;
        return Ok(());
    }

    let records: Vec<CredentialRecord> = entries.iter().map(CredentialRecord::from).collect();
    match export_records(
        raw_filename,
        INVENTORY_FILENAME_PREFIX,
        INVENTORY_SHEET_NAME,
        &records,
    ) {
        Ok(document) => {
            let caption = t_args_lang(
                "inventory-export-caption",
                &[("count", &records.len().to_string())],
                language_code,
            );
            send_export(bot, chat_id, document, caption).await?;
            ctx.inventory.clear(chat_id.0).await?;
            record_document(ctx, msg).await;
            dialogue.exit().await?;
            reply_html(
                bot,
                chat_id,
                t_lang("inventory-menu", language_code),
                inventory_keyboard(),
            )
            .await?;
        }
        Err(e) => {
            report_export_error(bot, chat_id, &e, CB_INVENTORY_CANCEL, language_code).await?;
        }
    }

    Ok(())
}
