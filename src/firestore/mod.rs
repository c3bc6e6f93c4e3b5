//! # Firestore
//!
//! The [`Firestore`] handle belongs to a [`FirebaseApp`] and is created
//! without touching the network. A gRPC connection is only made once a
//! [`FirestoreClient`] is requested, and from that point on the instance
//! counts as started: offline persistence has to be requested before that.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), firebase_bootstrap::error::FirebaseError> {
//! let db = firebase_bootstrap::db()?;
//!
//! let mut client = db.client().await?;
//! let holding = db.doc("portfolios/alice/holdings/AAPL")?;
//!
//! client
//!     .set_document(&holding, &serde_json::json!({ "shares": 12 }))
//!     .await?;
//!
//! let stored: Option<serde_json::Value> = client.get_document(&holding).await?;
//! assert_eq!(stored, Some(serde_json::json!({ "shares": 12 })));
//! # Ok(())
//! # }
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::anyhow;

use crate::{app::FirebaseApp, auth::Auth, error::FirebaseError};

use self::client::RequestMetadata;
use self::persistence::PersistenceLock;

pub mod client;
mod persistence;
pub mod reference;
mod settings;
mod value;

pub use client::FirestoreClient;
pub use reference::{collection, CollectionReference, DocumentReference};
pub use settings::{FirestoreSettings, LocalStorage};

/// Returns the Firestore instance of the given app, creating it with settings
/// from the environment if needed.
pub fn get_firestore(app: &FirebaseApp) -> Result<Firestore, FirebaseError> {
    app.firestore()
}

/// Creates the Firestore instance of the given app with explicit settings.
/// Fails if the app already has a Firestore instance.
pub fn initialize_firestore(
    app: &FirebaseApp,
    settings: FirestoreSettings,
) -> Result<Firestore, FirebaseError> {
    let firestore = Firestore::new(app, settings)?;
    app.set_firestore(firestore.clone())
        .map_err(|_| anyhow!("Firestore has already been initialised for this app"))?;
    Ok(firestore)
}

#[derive(Clone)]
pub struct Firestore(Arc<FirestoreInner>);

struct FirestoreInner {
    app_name: String,
    project_id: String,
    api_key: Option<String>,
    root_resource_path: String,
    settings: FirestoreSettings,
    auth: Option<Auth>,
    started: AtomicBool,
    persistence: Mutex<Option<PersistenceLock>>,
}

impl Firestore {
    pub(crate) fn new(
        app: &FirebaseApp,
        settings: FirestoreSettings,
    ) -> Result<Self, FirebaseError> {
        let project_id = match app.options().project_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(FirebaseError::MissingOption("projectId")),
        };

        let root_resource_path = format!("projects/{project_id}/databases/(default)/documents");

        Ok(Self(Arc::new(FirestoreInner {
            app_name: app.name().to_string(),
            api_key: app.options().api_key.clone(),
            // Without a usable API key there is no Auth, and requests go out
            // unauthenticated.
            auth: app.auth().ok(),
            project_id,
            root_resource_path,
            settings,
            started: AtomicBool::new(false),
            persistence: Mutex::new(None),
        })))
    }

    pub fn project_id(&self) -> &str {
        &self.0.project_id
    }

    /// The resource path all document names are relative to, e.g.
    /// `projects/{project_id}/databases/(default)/documents`.
    pub fn root_resource_path(&self) -> &str {
        &self.0.root_resource_path
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.0.settings
    }

    /// A reference to the collection at the given slash-separated path.
    pub fn collection(&self, path: &str) -> Result<CollectionReference, FirebaseError> {
        CollectionReference::try_from(path)
    }

    /// A reference to the document at the given slash-separated path.
    pub fn doc(&self, path: &str) -> Result<DocumentReference, FirebaseError> {
        DocumentReference::try_from(path)
    }

    /// Connects a client to the Firestore backend. After the first call the
    /// instance counts as started, even if connecting fails.
    pub async fn client(&self) -> Result<FirestoreClient, FirebaseError> {
        {
            // Held so that a persistence request finishing now sees the flag.
            let _persistence = self.lock_persistence();
            if !self.0.started.swap(true, Ordering::SeqCst) {
                tracing::debug!(project_id = %self.0.project_id, "Starting Firestore client");
            }
        }

        let resource_prefix = self
            .0
            .root_resource_path
            .trim_end_matches("/documents")
            .to_string();

        FirestoreClient::connect(
            &self.0.settings.host_url,
            self.0.root_resource_path.clone(),
            RequestMetadata {
                api_key: self.0.api_key.clone(),
                resource_prefix,
                auth: self.0.auth.clone(),
            },
        )
        .await
    }

    /// Whether both handles point to the same Firestore instance.
    pub fn ptr_eq(&self, other: &Firestore) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.0.project_id)
            .field("settings", &self.0.settings)
            .field("started", &self.0.started.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{app::initialize_app, config::FirebaseConfig};

    use super::*;

    fn app() -> FirebaseApp {
        initialize_app(FirebaseConfig {
            api_key: Some("test-api-key".to_string()),
            project_id: Some("stock-divi".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn resource_path_is_derived_from_the_project() {
        let db = get_firestore(&app()).unwrap();
        assert_eq!(db.project_id(), "stock-divi");
        assert_eq!(
            db.root_resource_path(),
            "projects/stock-divi/databases/(default)/documents"
        );
    }

    #[test]
    fn builds_references_from_paths() {
        let db = get_firestore(&app()).unwrap();
        assert_eq!(
            db.doc("portfolios/alice").unwrap(),
            collection("portfolios").doc("alice")
        );
        assert!(db.doc("portfolios").is_err());
        assert_eq!(db.collection("portfolios").unwrap().name(), "portfolios");
    }

    #[test]
    fn explicit_settings_can_only_be_given_once() {
        let app = app();
        let settings = FirestoreSettings::default().without_local_storage();

        let db = initialize_firestore(&app, settings.clone()).unwrap();
        assert_eq!(db.settings(), &settings);
        assert!(get_firestore(&app).unwrap().ptr_eq(&db));

        assert!(initialize_firestore(&app, FirestoreSettings::default()).is_err());
    }

    #[test]
    fn works_without_auth() {
        let app = initialize_app(FirebaseConfig {
            project_id: Some("stock-divi".to_string()),
            ..Default::default()
        });

        let db = get_firestore(&app).unwrap();
        assert!(db.0.auth.is_none());
    }

    #[test]
    fn handles_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Firestore>();
    }
}
