//! The process-wide app and the handles derived from it.
//!
//! The first successful call to [`app`] reads the configuration from the
//! environment, initialises the app, creates its Firestore and Auth instances,
//! and asks for offline persistence without waiting for the answer. Every
//! later call returns the same app. If creating a service fails, nothing is
//! kept and the next call starts over.

use firestore_grpc::tonic::Code;
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{
    app::{initialize_app, FirebaseApp},
    auth::{Auth, GoogleAuthProvider},
    config::FirebaseConfig,
    error::FirebaseError,
    firestore::Firestore,
};

static APP: OnceCell<FirebaseApp> = OnceCell::new();

/// The process-wide app.
pub fn app() -> Result<&'static FirebaseApp, FirebaseError> {
    APP.get_or_try_init(|| {
        let app = initialize_app(FirebaseConfig::from_env());
        let db = app.firestore()?;
        app.auth()?;

        enable_offline_persistence(&db);

        Ok(app)
    })
}

/// The process-wide app's Firestore instance.
pub fn db() -> Result<Firestore, FirebaseError> {
    app()?.firestore()
}

/// The process-wide app's Auth instance.
pub fn auth() -> Result<Auth, FirebaseError> {
    app()?.auth()
}

pub fn google_provider() -> GoogleAuthProvider {
    GoogleAuthProvider::new()
}

/// A persistence request running in the background.
#[derive(Debug)]
pub enum PersistenceRequest {
    /// Spawned on the caller's Tokio runtime.
    Task(JoinHandle<()>),
    /// Running on its own thread, for callers outside a runtime.
    Thread(std::thread::JoinHandle<()>),
}

/// Requests offline persistence in the background and returns immediately.
/// The outcome is only logged; the returned handle can be dropped.
///
/// Inside a Tokio runtime the request is a task on that runtime, otherwise it
/// gets a thread of its own. `None` means the thread could not be spawned.
pub fn enable_offline_persistence(db: &Firestore) -> Option<PersistenceRequest> {
    let db = db.clone();

    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        let task = async move { report_persistence_outcome(db.enable_persistence().await) };
        return Some(PersistenceRequest::Task(runtime.spawn(task.in_current_span())));
    }

    let span = tracing::Span::current();
    let spawned = std::thread::Builder::new()
        .name("firestore-persistence".to_string())
        .spawn(move || {
            span.in_scope(|| report_persistence_outcome(db.enable_persistence_blocking()))
        });

    match spawned {
        Ok(handle) => Some(PersistenceRequest::Thread(handle)),
        Err(e) => {
            tracing::debug!(error = %e, "Offline persistence was not requested");
            None
        }
    }
}

/// Logs the outcome of a persistence request. Only the two expected failures
/// produce warnings.
pub fn report_persistence_outcome(result: Result<(), FirebaseError>) {
    let err = match result {
        Ok(()) => {
            tracing::debug!("Firestore offline persistence enabled");
            return;
        }
        Err(err) => err,
    };

    match err.persistence_code() {
        Some(Code::FailedPrecondition) => {
            tracing::warn!("Firestore persistence failed: multiple sessions open")
        }
        Some(Code::Unimplemented) => tracing::warn!(
            "Firestore persistence not available: this environment lacks local storage support"
        ),
        _ => tracing::debug!(error = %err, "Firestore offline cache was left off"),
    }
}
