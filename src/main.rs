use std::time::Duration;

use firebase_bootstrap::error::FirebaseError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), FirebaseError> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env file loaded: {}", e),
    }

    let app = firebase_bootstrap::app()?;
    let db = firebase_bootstrap::db()?;
    let provider = firebase_bootstrap::google_provider();

    tracing::info!(
        project_id = db.project_id(),
        provider = provider.provider_id(),
        "Firebase app initialised"
    );

    // The persistence request runs in the background. Give it a moment so the
    // report below reflects its outcome.
    for _ in 0..20 {
        if db.persistence_enabled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    println!("app:         {}", app.name());
    println!("project:     {}", db.project_id());
    let persistence = if db.persistence_enabled() {
        "enabled"
    } else {
        "disabled"
    };
    println!("persistence: {persistence}");

    Ok(())
}
