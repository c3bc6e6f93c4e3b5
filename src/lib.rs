//! # Firebase Bootstrap
//!
//! Sets up the Firebase web app of an application from its environment and
//! hands out entry points to:
//!
//! - **Firestore**: the document database, see the [`firestore`] module.
//! - **Firebase Auth**: email/password and identity provider sign-in, see the
//!   [`auth`] module.
//! - **Google sign-in**: the [`GoogleAuthProvider`] descriptor.
//!
//! ## Configuration
//!
//! The app is configured from the variables of the console's web app
//! snippet, see [`FirebaseConfig`]:
//!
//! ```text
//! REACT_APP_FIREBASE_API_KEY
//! REACT_APP_FIREBASE_AUTH_DOMAIN
//! REACT_APP_FIREBASE_PROJECT_ID
//! REACT_APP_FIREBASE_STORAGE_BUCKET
//! REACT_APP_FIREBASE_MESSAGING_SENDER_ID
//! REACT_APP_FIREBASE_APP_ID
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), firebase_bootstrap::error::FirebaseError> {
//! // The first call initialises the app and requests offline persistence.
//! let app = firebase_bootstrap::app()?;
//! let db = firebase_bootstrap::db()?;
//! let auth = firebase_bootstrap::auth()?;
//! let google = firebase_bootstrap::google_provider();
//!
//! assert_eq!(db.project_id(), app.options().project_id.as_deref().unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! [`GoogleAuthProvider`]: auth::GoogleAuthProvider

pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod firestore;

pub use app::{initialize_app, FirebaseApp};
pub use bootstrap::{app, auth, db, google_provider};
pub use config::FirebaseConfig;
