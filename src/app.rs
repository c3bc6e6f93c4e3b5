use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::{
    auth::Auth,
    config::FirebaseConfig,
    error::FirebaseError,
    firestore::{Firestore, FirestoreSettings},
};

pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Handle to an initialised Firebase app. Cloning is cheap and every clone
/// refers to the same app, including its service instances.
#[derive(Clone)]
pub struct FirebaseApp(Arc<FirebaseAppInner>);

struct FirebaseAppInner {
    name: String,
    options: FirebaseConfig,
    firestore: OnceCell<Firestore>,
    auth: OnceCell<Auth>,
}

/// Creates an app from the given configuration, which is stored as-is.
///
/// No field is checked here. A missing project ID or a bad API key is only
/// reported once the Firestore or Auth service is requested for the app.
pub fn initialize_app(options: FirebaseConfig) -> FirebaseApp {
    tracing::debug!(
        project_id = options.project_id.as_deref().unwrap_or_default(),
        "Initialising Firebase app"
    );

    FirebaseApp(Arc::new(FirebaseAppInner {
        name: DEFAULT_APP_NAME.to_string(),
        options,
        firestore: OnceCell::new(),
        auth: OnceCell::new(),
    }))
}

impl FirebaseApp {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The configuration the app was initialised with.
    pub fn options(&self) -> &FirebaseConfig {
        &self.0.options
    }

    /// The Firestore instance of this app, created on first use. Fails if the
    /// app has no project ID.
    pub fn firestore(&self) -> Result<Firestore, FirebaseError> {
        self.0
            .firestore
            .get_or_try_init(|| Firestore::new(self, FirestoreSettings::from_env()))
            .cloned()
    }

    pub(crate) fn set_firestore(&self, firestore: Firestore) -> Result<(), Firestore> {
        self.0.firestore.set(firestore)
    }

    /// The Auth instance of this app, created on first use. Fails if the app
    /// has no usable API key.
    pub fn auth(&self) -> Result<Auth, FirebaseError> {
        self.0.auth.get_or_try_init(|| Auth::new(self)).cloned()
    }

    /// Whether both handles point to the same app.
    pub fn ptr_eq(&self, other: &FirebaseApp) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("name", &self.0.name)
            .field("options", &self.0.options)
            .finish_non_exhaustive()
    }
}
