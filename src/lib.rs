//! # FB Document Telegram Bot
//!
//! A Telegram bot that collects Facebook account credentials (UID, password,
//! cookie), validates them and renders them into a styled XLSX workbook.
//! Accounts can also be staged one by one in an inventory and exported
//! together, and admins control who may use the bot.

pub mod access;
pub mod bot;
pub mod config;
pub mod credential_parser;
pub mod credential_patterns;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod inventory;
pub mod localization;
pub mod xlsx_export;
