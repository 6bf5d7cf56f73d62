//! # Inventory Tests
//!
//! Cookie/password acceptance and the in-memory staging store.

use std::sync::Arc;

use anyhow::Result;

use fbdocbot::credential_parser::CredentialRecord;
use fbdocbot::inventory::{
    accept_inventory_cookie, validate_inventory_password, InMemoryInventoryStore, InventoryError,
    InventoryStore,
};
use fbdocbot::xlsx_export::{export_records, INVENTORY_FILENAME_PREFIX, INVENTORY_SHEET_NAME};

#[test]
fn test_accept_inventory_cookie_extracts_uid() {
    assert_eq!(
        accept_inventory_cookie("datr=abc; c_user=100012345678; xs=22%3Aabc;"),
        Ok("100012345678".to_string())
    );
    assert_eq!(
        accept_inventory_cookie("datr=abc; xs=22%3Aabc;"),
        Err(InventoryError::MissingCUser)
    );
    assert_eq!(
        accept_inventory_cookie("c_user=100012345678; datr=abc"),
        Err(InventoryError::MissingXs)
    );
    // c_user present but too short to be a UID
    assert_eq!(
        accept_inventory_cookie("c_user=42; xs=abc"),
        Err(InventoryError::UidNotDetected)
    );
}

#[test]
fn test_inventory_password_rules() {
    assert!(validate_inventory_password("Secret1").is_ok());
    assert_eq!(
        validate_inventory_password("abc"),
        Err(InventoryError::InvalidPassword)
    );
    assert_eq!(
        validate_inventory_password("has space"),
        Err(InventoryError::InvalidPassword)
    );
    // Typed empty passwords are refused; only the skip button stores one
    assert_eq!(
        validate_inventory_password(""),
        Err(InventoryError::InvalidPassword)
    );
}

#[tokio::test]
async fn test_store_keeps_insertion_order_and_meta() -> Result<()> {
    let store = InMemoryInventoryStore::new();

    store
        .add_entry(1, "11111111", "Secret1", "c_user=11111111;xs=a;")
        .await?;
    store
        .add_entry(1, "22222222", "", "c_user=22222222;xs=b;")
        .await?;

    let entries = store.entries(1).await?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].uid, "11111111");
    assert_eq!(entries[1].uid, "22222222");
    assert_eq!(store.count(1).await?, 2);

    let meta = store.meta(1).await?;
    assert_eq!(meta.last_uid, "22222222");
    assert!(meta.last_password_empty);
    assert!(meta.last_input_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_store_isolates_users_and_clears() -> Result<()> {
    let store = InMemoryInventoryStore::new();
    store
        .add_entry(1, "11111111", "Secret1", "c_user=11111111;xs=a;")
        .await?;
    store
        .add_entry(2, "22222222", "Secret2", "c_user=22222222;xs=b;")
        .await?;

    store.clear(1).await?;
    assert_eq!(store.count(1).await?, 0);
    assert_eq!(store.meta(1).await?.last_input_at, None);
    assert_eq!(store.count(2).await?, 1);

    // Clearing an unknown user is a no-op
    store.clear(99).await?;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_adds_are_all_kept() -> Result<()> {
    let store: Arc<dyn InventoryStore> = Arc::new(InMemoryInventoryStore::new());

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let uid = format!("{:08}", 10_000_000 + i);
            let cookie = format!("c_user={uid};xs=abc;");
            store.add_entry(7, &uid, "Secret1", &cookie).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(store.count(7).await?, 10);
    Ok(())
}

/// Export renders every staged entry in order, then the store can be cleared
#[tokio::test]
async fn test_export_then_clear() -> Result<()> {
    let store = InMemoryInventoryStore::new();
    store
        .add_entry(5, "11111111", "Secret1", "c_user=11111111;xs=a;")
        .await?;
    store
        .add_entry(5, "22222222", "", "c_user=22222222;xs=b;")
        .await?;

    let records: Vec<CredentialRecord> = store
        .entries(5)
        .await?
        .iter()
        .map(CredentialRecord::from)
        .collect();
    assert_eq!(records[1].password, "");

    let document = export_records("stock", INVENTORY_FILENAME_PREFIX, INVENTORY_SHEET_NAME, &records)?;
    assert_eq!(document.filename, "stock.xlsx");
    assert!(!document.bytes.is_empty());

    store.clear(5).await?;
    assert!(store.entries(5).await?.is_empty());
    Ok(())
}
