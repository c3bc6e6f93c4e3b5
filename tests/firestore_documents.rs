//! Runs against the Firestore emulator and is skipped unless
//! `FIRESTORE_EMULATOR_HOST` is set, e.g.
//! `firebase emulators:exec --only firestore "cargo test --test firestore_documents"`.

use firebase_bootstrap::{
    firestore::{collection, initialize_firestore, FirestoreSettings},
    initialize_app, FirebaseConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Holding {
    symbol: String,
    shares: i64,
    tags: Vec<String>,
}

fn emulator_settings() -> Option<FirestoreSettings> {
    std::env::var("FIRESTORE_EMULATOR_HOST")
        .ok()
        .filter(|host| !host.is_empty())
        .map(|_| FirestoreSettings::from_env().without_local_storage())
}

#[tokio::test]
async fn set_get_and_delete_a_document() -> Result<(), Box<dyn std::error::Error>> {
    let Some(settings) = emulator_settings() else {
        return Ok(());
    };

    let app = initialize_app(FirebaseConfig {
        api_key: Some("emulator-api-key".to_string()),
        project_id: Some("demo-stock-divi".to_string()),
        ..Default::default()
    });
    let db = initialize_firestore(&app, settings)?;
    let mut client = db.client().await?;

    let doc_ref = collection("portfolios")
        .doc(format!("alice-{}", ulid::Ulid::new()))
        .collection("holdings")
        .doc("AAPL");

    let holding = Holding {
        symbol: "AAPL".to_string(),
        shares: 12,
        tags: vec!["tech".to_string(), "dividend".to_string()],
    };
    client.set_document(&doc_ref, &holding).await?;

    let stored = client.get_document::<Holding>(&doc_ref).await?;
    assert_eq!(stored, Some(holding));

    client.delete_document(&doc_ref).await?;
    assert_eq!(client.get_document::<Holding>(&doc_ref).await?, None);

    // Deleting again still succeeds.
    client.delete_document(&doc_ref).await?;

    Ok(())
}

#[tokio::test]
async fn missing_document_is_none() -> Result<(), Box<dyn std::error::Error>> {
    let Some(settings) = emulator_settings() else {
        return Ok(());
    };

    let app = initialize_app(FirebaseConfig {
        api_key: Some("emulator-api-key".to_string()),
        project_id: Some("demo-stock-divi".to_string()),
        ..Default::default()
    });
    let mut client = initialize_firestore(&app, settings)?.client().await?;

    let doc_ref = collection("portfolios").doc(format!("nobody-{}", ulid::Ulid::new()));
    let doc = client.get_document::<serde_json::Value>(&doc_ref).await?;

    assert_eq!(doc, None);

    Ok(())
}
