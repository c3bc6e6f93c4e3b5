//! # Firebase Auth
//!
//! The [`Auth`] handle signs users in against the Identity Toolkit REST API
//! using the app's web API key, and remembers the current user so that other
//! services (Firestore) can act on their behalf.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), firebase_bootstrap::error::FirebaseError> {
//! let auth = firebase_bootstrap::auth()?;
//!
//! let user = auth
//!     .sign_in_with_email_and_password("caesar@rome.it", "venividivici")
//!     .await?;
//!
//! println!("Signed in as {}", user.uid);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, RwLock};

use anyhow::Context;

use crate::{app::FirebaseApp, error::FirebaseError};

use self::{error::AuthApiError, models::SignInResponse};

mod error;
pub mod models;
pub mod provider;

pub use models::{IdTokenClaims, User};
pub use provider::{GoogleAuthProvider, OAuthCredential};

const EMULATOR_HOST_VAR: &str = "FIREBASE_AUTH_EMULATOR_HOST";

#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub api_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            api_url: "https://identitytoolkit.googleapis.com/v1/accounts".to_string(),
        }
    }
}

impl AuthSettings {
    /// The default settings, pointed at a local emulator when
    /// `FIREBASE_AUTH_EMULATOR_HOST` is set.
    pub fn from_env() -> Self {
        match std::env::var(EMULATOR_HOST_VAR) {
            Ok(host) if !host.is_empty() => Self::default().api_url(format!(
                "http://{host}/identitytoolkit.googleapis.com/v1/accounts"
            )),
            _ => Self::default(),
        }
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Returns the Auth instance of the given app.
pub fn get_auth(app: &FirebaseApp) -> Result<Auth, FirebaseError> {
    app.auth()
}

#[derive(Clone)]
pub struct Auth(Arc<AuthInner>);

struct AuthInner {
    client: reqwest::Client,
    api_url: String,
    auth_domain: Option<String>,
    current_user: RwLock<Option<User>>,
}

impl Auth {
    pub(crate) fn new(app: &FirebaseApp) -> Result<Self, FirebaseError> {
        let options = app.options();
        let api_key = options.api_key.as_deref().unwrap_or_default();

        Self::with_settings(api_key, options.auth_domain.clone(), AuthSettings::from_env())
    }

    /// Creates an Auth instance that is not tied to an app. Mostly useful to
    /// talk to an emulator or a mock server.
    pub fn with_settings(
        api_key: &str,
        auth_domain: Option<String>,
        settings: AuthSettings,
    ) -> Result<Self, FirebaseError> {
        if api_key.is_empty() || api_key.contains(':') {
            return Err(FirebaseError::InvalidApiKey);
        }

        let mut default_headers = reqwest::header::HeaderMap::new();

        let mut api_key_header =
            reqwest::header::HeaderValue::from_str(api_key).context("Invalid API key")?;
        api_key_header.set_sensitive(true);
        default_headers.insert("X-goog-api-key", api_key_header);

        let client = reqwest::Client::builder()
            .https_only(settings.api_url.starts_with("https://"))
            .default_headers(default_headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self(Arc::new(AuthInner {
            client,
            api_url: settings.api_url,
            auth_domain,
            current_user: RwLock::new(None),
        })))
    }

    fn url(&self, path: impl AsRef<str>) -> String {
        format!("{}:{}", self.0.api_url, path.as_ref())
    }

    /// The currently signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.0
            .current_user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn current_id_token(&self) -> Option<String> {
        self.0
            .current_user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|user| user.id_token.clone())
    }

    pub fn sign_out(&self) {
        self.set_current_user(None);
    }

    fn set_current_user(&self, user: Option<User>) {
        *self
            .0
            .current_user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    /// Creates a new email/password account and signs it in.
    #[tracing::instrument(name = "Sign up with email", skip(self, password))]
    pub async fn sign_up_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, FirebaseError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true
        });

        let response = self.post("signUp", &body).await?;
        Ok(self.sign_in(response.into_user("password", true)))
    }

    #[tracing::instrument(name = "Sign in with email", skip(self, password))]
    pub async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, FirebaseError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true
        });

        let response = self.post("signInWithPassword", &body).await?;
        Ok(self.sign_in(response.into_user("password", false)))
    }

    /// Signs in with a credential issued by an identity provider, such as one
    /// made by [`GoogleAuthProvider::credential`].
    #[tracing::instrument(
        name = "Sign in with credential",
        skip_all,
        fields(provider = %credential.provider_id)
    )]
    pub async fn sign_in_with_credential(
        &self,
        credential: &OAuthCredential,
    ) -> Result<User, FirebaseError> {
        let body = serde_json::json!({
            "postBody": credential.post_body(),
            "requestUri": self.request_uri(),
            "returnIdpCredential": true,
            "returnSecureToken": true
        });

        let response = self.post("signInWithIdp", &body).await?;
        Ok(self.sign_in(response.into_user(&credential.provider_id, false)))
    }

    fn request_uri(&self) -> String {
        match &self.0.auth_domain {
            Some(domain) if !domain.is_empty() => format!("https://{domain}/__/auth/handler"),
            _ => "http://localhost".to_string(),
        }
    }

    fn sign_in(&self, user: User) -> User {
        tracing::debug!(uid = %user.uid, provider = %user.provider_id, "User signed in");
        self.set_current_user(Some(user.clone()));
        user
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<SignInResponse, FirebaseError> {
        let res = self
            .0
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {path} request"))?;

        if res.status().is_success() {
            let response = res.json().await.context("Failed to read response JSON")?;
            Ok(response)
        } else {
            Err(res
                .json::<AuthApiError>()
                .await
                .context("Failed to read response JSON")?
                .into())
        }
    }

    /// Whether both handles point to the same Auth instance.
    pub fn ptr_eq(&self, other: &Auth) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
