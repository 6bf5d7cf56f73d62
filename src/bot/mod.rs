//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Routes incoming text messages and menu selections
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Document and inventory flow steps
//! - `admin_handler`: Whitelist, access duration, block list, broadcast and stats

pub mod admin_handler;
pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::access::AccessStore;
use crate::dialogue::DocDialogueState;
use crate::inventory::InventoryStore;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Services shared by every handler
pub struct BotContext {
    pub access: AccessStore,
    pub inventory: Arc<dyn InventoryStore>,
}

pub type SharedContext = Arc<BotContext>;

impl BotContext {
    pub fn new(access: AccessStore, inventory: Arc<dyn InventoryStore>) -> SharedContext {
        Arc::new(Self { access, inventory })
    }
}

/// Update routing: messages and callback queries both enter the per-chat dialogue
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let message_branch = Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<DocDialogueState>, DocDialogueState>()
        .endpoint(message_handler);

    let callback_branch = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, InMemStorage<DocDialogueState>, DocDialogueState>()
        .endpoint(callback_handler);

    dptree::entry().branch(message_branch).branch(callback_branch)
}
