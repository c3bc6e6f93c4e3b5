use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "REACT_APP_FIREBASE_API_KEY";
pub const AUTH_DOMAIN_VAR: &str = "REACT_APP_FIREBASE_AUTH_DOMAIN";
pub const PROJECT_ID_VAR: &str = "REACT_APP_FIREBASE_PROJECT_ID";
pub const STORAGE_BUCKET_VAR: &str = "REACT_APP_FIREBASE_STORAGE_BUCKET";
pub const MESSAGING_SENDER_ID_VAR: &str = "REACT_APP_FIREBASE_MESSAGING_SENDER_ID";
pub const APP_ID_VAR: &str = "REACT_APP_FIREBASE_APP_ID";

/// The web app configuration shown under "Your apps" in the Firebase console.
///
/// Every field is read from exactly one environment variable and is `None`
/// when that variable is unset. Nothing is defaulted or validated here; the
/// services that need a field complain when they are created.
///
/// `Debug` is implemented by hand so the API key does not end up in logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl FirebaseConfig {
    pub const ENV_VARS: [&'static str; 6] = [
        API_KEY_VAR,
        AUTH_DOMAIN_VAR,
        PROJECT_ID_VAR,
        STORAGE_BUCKET_VAR,
        MESSAGING_SENDER_ID_VAR,
        APP_ID_VAR,
    ];

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Assembles the configuration from any name-to-value lookup. The lookup
    /// is called once per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(API_KEY_VAR),
            auth_domain: lookup(AUTH_DOMAIN_VAR),
            project_id: lookup(PROJECT_ID_VAR),
            storage_bucket: lookup(STORAGE_BUCKET_VAR),
            messaging_sender_id: lookup(MESSAGING_SENDER_ID_VAR),
            app_id: lookup(APP_ID_VAR),
        }
    }
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .finish()
    }
}
