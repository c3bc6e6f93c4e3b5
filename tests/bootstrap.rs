use std::time::Duration;

use firebase_bootstrap::config::{
    FirebaseConfig, API_KEY_VAR, APP_ID_VAR, AUTH_DOMAIN_VAR, MESSAGING_SENDER_ID_VAR,
    PROJECT_ID_VAR, STORAGE_BUCKET_VAR,
};

#[tokio::test]
async fn app_is_initialised_once_from_the_environment() -> Result<(), Box<dyn std::error::Error>> {
    let cache = tempfile::tempdir()?;

    let environment = [
        (API_KEY_VAR, "AIzaSyTest-Key"),
        (AUTH_DOMAIN_VAR, "stock-divi.firebaseapp.com"),
        (PROJECT_ID_VAR, "stock-divi"),
        (STORAGE_BUCKET_VAR, "stock-divi.appspot.com"),
        (MESSAGING_SENDER_ID_VAR, "123456789012"),
        (APP_ID_VAR, "1:123456789012:web:abcdef"),
    ];
    for (name, value) in environment {
        std::env::set_var(name, value);
    }
    std::env::set_var("FIRESTORE_PERSISTENCE_DIR", cache.path());
    std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    std::env::remove_var("FIREBASE_AUTH_EMULATOR_HOST");

    let first = firebase_bootstrap::app()?;
    let second = firebase_bootstrap::app()?;

    assert!(std::ptr::eq(first, second));
    assert_eq!(
        first.options(),
        &FirebaseConfig {
            api_key: Some("AIzaSyTest-Key".to_string()),
            auth_domain: Some("stock-divi.firebaseapp.com".to_string()),
            project_id: Some("stock-divi".to_string()),
            storage_bucket: Some("stock-divi.appspot.com".to_string()),
            messaging_sender_id: Some("123456789012".to_string()),
            app_id: Some("1:123456789012:web:abcdef".to_string()),
        }
    );

    // The environment is only read once.
    std::env::set_var(PROJECT_ID_VAR, "another-project");
    assert_eq!(
        firebase_bootstrap::app()?.options().project_id.as_deref(),
        Some("stock-divi")
    );

    let db = firebase_bootstrap::db()?;
    assert!(db.ptr_eq(&first.firestore()?));
    assert!(firebase_bootstrap::auth()?.ptr_eq(&first.auth()?));
    assert_eq!(firebase_bootstrap::google_provider().provider_id(), "google.com");

    // Persistence was requested in the background during initialisation.
    for _ in 0..200 {
        if db.persistence_enabled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(db.persistence_enabled());
    assert!(cache.path().join("owner.lock").exists());

    Ok(())
}
