//! Conversation state for the document, inventory and admin flows.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::credential_parser::{
    accept_manual_cookies, accept_manual_passwords, accept_manual_uids, CredentialTriple,
};
use crate::errors::ValidationError;

pub const MENU_RESTART: &str = "🚀 Restart";
pub const MENU_CANCEL: &str = "❌ Cancel";

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DocDialogueState {
    #[default]
    Idle,
    AwaitingUids,
    AwaitingPasswords {
        uids: Vec<String>,
    },
    AwaitingCookies {
        uids: Vec<String>,
        passwords: Vec<String>,
    },
    AwaitingInstantPayload,
    AwaitingFilename {
        triple: CredentialTriple,
    },
    InventoryAwaitingCookie,
    InventoryAwaitingPassword {
        uid: String,
        cookie: String,
    },
    InventoryAwaitingFilename,
    AdminMenu,
    AdminAwaitingWhitelist,
    AdminAwaitingDuration,
    AdminAwaitingBlock,
    AdminAwaitingBroadcast,
}

/// Type alias for our document dialogue
pub type DocDialogue = Dialogue<DocDialogueState, InMemStorage<DocDialogueState>>;

/// Outcome of feeding one message to the manual flow
#[derive(Debug, Clone, PartialEq)]
pub enum ManualStep {
    /// Input accepted, move to the carried state
    Advance(DocDialogueState),
    /// Input rejected, stay in the current state
    Rejected(ValidationError),
    /// Reset text received, return to idle
    Reset,
    /// The state is not part of the manual flow
    NotApplicable,
}

/// Texts that abandon any flow and return to the main menu
pub fn is_reset_text(text: &str) -> bool {
    matches!(
        text.trim(),
        "/start" | "/cancel" | "Start" | "Cancel" | "Batal" | MENU_RESTART | MENU_CANCEL
    )
}

/// Advance the manual UID → password → cookie → filename flow by one message
pub fn advance_manual(state: &DocDialogueState, input: &str) -> ManualStep {
    if is_reset_text(input) {
        return ManualStep::Reset;
    }
    let raw = input.trim();

    match state {
        DocDialogueState::AwaitingUids => match accept_manual_uids(raw) {
            Ok(uids) => ManualStep::Advance(DocDialogueState::AwaitingPasswords { uids }),
            Err(e) => ManualStep::Rejected(e),
        },
        DocDialogueState::AwaitingPasswords { uids } => match accept_manual_passwords(raw, uids) {
            Ok(passwords) => ManualStep::Advance(DocDialogueState::AwaitingCookies {
                uids: uids.clone(),
                passwords,
            }),
            Err(e) => ManualStep::Rejected(e),
        },
        DocDialogueState::AwaitingCookies { uids, passwords } => {
            match accept_manual_cookies(raw, uids, passwords) {
                Ok(triple) => ManualStep::Advance(DocDialogueState::AwaitingFilename { triple }),
                Err(e) => ManualStep::Rejected(e),
            }
        }
        _ => ManualStep::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_from_any_state() {
        let states = [
            DocDialogueState::AwaitingUids,
            DocDialogueState::AwaitingPasswords {
                uids: vec!["12345678".to_string()],
            },
            DocDialogueState::InventoryAwaitingFilename,
        ];
        for state in &states {
            assert_eq!(advance_manual(state, "/cancel"), ManualStep::Reset);
            assert_eq!(advance_manual(state, " Batal "), ManualStep::Reset);
        }
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(DocDialogueState::default(), DocDialogueState::Idle);
        assert_eq!(
            advance_manual(&DocDialogueState::Idle, "12345678 "),
            ManualStep::NotApplicable
        );
    }
}
