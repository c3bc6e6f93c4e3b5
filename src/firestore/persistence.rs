use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{atomic::Ordering, MutexGuard},
};

use anyhow::Context;
use firestore_grpc::tonic::Code;
use fs2::FileExt;
use ulid::Ulid;

use crate::error::FirebaseError;

use super::{settings::LocalStorage, Firestore};

const LOCK_FILE_NAME: &str = "owner.lock";

/// Exclusive ownership of an offline cache directory. The OS lock is released
/// when the file is closed, i.e. when this is dropped.
pub(crate) struct PersistenceLock {
    _file: File,
    session_id: Ulid,
    dir: PathBuf,
}

impl PersistenceLock {
    fn acquire(dir: &Path) -> Result<Self, FirebaseError> {
        std::fs::create_dir_all(dir).with_context(|| {
            format!("Failed to create persistence directory {}", dir.display())
        })?;

        let path = dir.join(LOCK_FILE_NAME);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        if let Err(err) = file.try_lock_exclusive() {
            let contended = err.kind() == ErrorKind::WouldBlock
                || err.raw_os_error() == fs2::lock_contended_error().raw_os_error();

            return Err(if contended {
                FirebaseError::persistence(
                    Code::FailedPrecondition,
                    "Another session already owns the offline cache",
                )
            } else {
                anyhow::Error::new(err)
                    .context(format!("Failed to lock {}", path.display()))
                    .into()
            });
        }

        let session_id = Ulid::new();
        file.set_len(0)
            .and_then(|_| file.write_all(session_id.to_string().as_bytes()))
            .with_context(|| format!("Failed to record session in {}", path.display()))?;

        Ok(Self {
            _file: file,
            session_id,
            dir: dir.to_path_buf(),
        })
    }
}

impl Firestore {
    /// Claims a local cache directory for this instance so data can be kept
    /// for offline use.
    ///
    /// Fails with [`Code::FailedPrecondition`] when the client has already
    /// been started, when persistence is already enabled for this instance, or
    /// when another session owns the cache. Fails with [`Code::Unimplemented`]
    /// when the environment has no local storage for a cache.
    #[tracing::instrument(name = "Enable persistence", skip(self))]
    pub async fn enable_persistence(&self) -> Result<(), FirebaseError> {
        let dir = self.persistence_target()?;

        let lock = tokio::task::spawn_blocking(move || PersistenceLock::acquire(&dir))
            .await
            .context("Persistence task failed")??;

        self.keep_persistence_lock(lock)
    }

    /// Same as [`enable_persistence`](Self::enable_persistence), for callers
    /// outside an async runtime. Blocks while the cache is claimed.
    #[tracing::instrument(name = "Enable persistence", skip(self))]
    pub fn enable_persistence_blocking(&self) -> Result<(), FirebaseError> {
        let dir = self.persistence_target()?;
        let lock = PersistenceLock::acquire(&dir)?;
        self.keep_persistence_lock(lock)
    }

    /// The directory to claim, if persistence can still be enabled.
    fn persistence_target(&self) -> Result<PathBuf, FirebaseError> {
        if self.0.started.load(Ordering::SeqCst) {
            return Err(already_started());
        }

        if self.persistence_enabled() {
            return Err(already_enabled());
        }

        self.persistence_dir().ok_or_else(|| {
            FirebaseError::persistence(
                Code::Unimplemented,
                "This environment has no local storage for an offline cache",
            )
        })
    }

    /// Stores a freshly acquired lock. `client()` flips `started` under the
    /// same mutex, so a started instance never ends up with a cache. On
    /// failure the lock is dropped, which releases the directory.
    fn keep_persistence_lock(&self, lock: PersistenceLock) -> Result<(), FirebaseError> {
        let mut slot = self.lock_persistence();

        if self.0.started.load(Ordering::SeqCst) {
            return Err(already_started());
        }
        if slot.is_some() {
            return Err(already_enabled());
        }

        tracing::debug!(
            dir = %lock.dir.display(),
            session = %lock.session_id,
            "Claimed offline cache"
        );
        *slot = Some(lock);

        Ok(())
    }

    pub(super) fn lock_persistence(&self) -> MutexGuard<'_, Option<PersistenceLock>> {
        self.0
            .persistence
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn persistence_enabled(&self) -> bool {
        self.lock_persistence().is_some()
    }

    /// The session ID recorded in the cache's lock file, once persistence is
    /// enabled.
    pub fn persistence_session(&self) -> Option<Ulid> {
        self.lock_persistence()
            .as_ref()
            .map(|lock| lock.session_id)
    }

    /// The directory the offline cache lives in, or `None` if there is no
    /// local storage.
    pub fn persistence_dir(&self) -> Option<PathBuf> {
        match &self.0.settings.local_storage {
            LocalStorage::Directory(dir) => Some(dir.clone()),
            LocalStorage::Unavailable => None,
            LocalStorage::Platform => dirs::data_local_dir().map(|base| {
                base.join(env!("CARGO_PKG_NAME"))
                    .join(path_safe(&self.0.app_name))
                    .join(path_safe(&self.0.project_id))
            }),
        }
    }
}

fn already_started() -> FirebaseError {
    FirebaseError::persistence(
        Code::FailedPrecondition,
        "Firestore has already been started and persistence can no longer be enabled",
    )
}

fn already_enabled() -> FirebaseError {
    FirebaseError::persistence(
        Code::FailedPrecondition,
        "Persistence is already enabled for this instance",
    )
}

fn path_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        app::initialize_app,
        config::FirebaseConfig,
        firestore::{initialize_firestore, FirestoreSettings},
    };

    use super::*;

    fn firestore_with(settings: FirestoreSettings) -> Firestore {
        let app = initialize_app(FirebaseConfig {
            api_key: Some("test-api-key".to_string()),
            project_id: Some("stock-divi".to_string()),
            ..Default::default()
        });
        initialize_firestore(&app, settings).unwrap()
    }

    #[tokio::test]
    async fn claims_the_cache_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = firestore_with(FirestoreSettings::default().persistence_dir(dir.path()));

        db.enable_persistence().await.unwrap();

        assert!(db.persistence_enabled());
        let recorded = std::fs::read_to_string(dir.path().join(LOCK_FILE_NAME)).unwrap();
        assert_eq!(recorded, db.persistence_session().unwrap().to_string());
    }

    #[tokio::test]
    async fn a_second_session_is_rejected_until_the_first_goes_away() {
        let dir = tempfile::tempdir().unwrap();
        let first = firestore_with(FirestoreSettings::default().persistence_dir(dir.path()));
        let second = firestore_with(FirestoreSettings::default().persistence_dir(dir.path()));

        first.enable_persistence().await.unwrap();

        let err = second.enable_persistence().await.unwrap_err();
        assert_eq!(err.persistence_code(), Some(Code::FailedPrecondition));
        assert!(!second.persistence_enabled());

        drop(first);
        second.enable_persistence().await.unwrap();
        assert!(second.persistence_enabled());
    }

    #[tokio::test]
    async fn enabling_twice_is_a_failed_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let db = firestore_with(FirestoreSettings::default().persistence_dir(dir.path()));

        db.enable_persistence().await.unwrap();
        let err = db.enable_persistence().await.unwrap_err();

        assert_eq!(err.persistence_code(), Some(Code::FailedPrecondition));
        assert!(db.persistence_enabled());
    }

    #[tokio::test]
    async fn no_local_storage_is_unimplemented() {
        let db = firestore_with(FirestoreSettings::default().without_local_storage());

        let err = db.enable_persistence().await.unwrap_err();

        assert_eq!(err.persistence_code(), Some(Code::Unimplemented));
        assert_eq!(db.persistence_dir(), None);
    }

    #[tokio::test]
    async fn started_client_is_a_failed_precondition() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on port 1, so connecting fails, but the instance
        // still counts as started.
        let db = firestore_with(
            FirestoreSettings::default()
                .host_url("http://127.0.0.1:1")
                .persistence_dir(dir.path()),
        );

        assert!(db.client().await.is_err());
        let err = db.enable_persistence().await.unwrap_err();

        assert_eq!(err.persistence_code(), Some(Code::FailedPrecondition));
    }

    #[tokio::test]
    async fn a_client_started_while_claiming_keeps_the_cache_free() {
        let dir = tempfile::tempdir().unwrap();
        let db = firestore_with(
            FirestoreSettings::default()
                .host_url("http://127.0.0.1:1")
                .persistence_dir(dir.path()),
        );

        // The directory was claimed before the client started.
        let lock = PersistenceLock::acquire(dir.path()).unwrap();
        assert!(db.client().await.is_err());

        let err = db.keep_persistence_lock(lock).unwrap_err();

        assert_eq!(err.persistence_code(), Some(Code::FailedPrecondition));
        assert!(!db.persistence_enabled());
        // The rejected lock was released again.
        PersistenceLock::acquire(dir.path()).unwrap();
    }

    #[test]
    fn claims_the_cache_without_a_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let db = firestore_with(FirestoreSettings::default().persistence_dir(dir.path()));

        db.enable_persistence_blocking().unwrap();

        assert!(db.persistence_enabled());
        let err = db.enable_persistence_blocking().unwrap_err();
        assert_eq!(err.persistence_code(), Some(Code::FailedPrecondition));
    }

    #[tokio::test]
    async fn io_failures_have_no_persistence_code() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file");
        std::fs::write(&not_a_dir, b"").unwrap();
        let db = firestore_with(
            FirestoreSettings::default().persistence_dir(not_a_dir.join("cache")),
        );

        let err = db.enable_persistence().await.unwrap_err();

        assert_eq!(err.persistence_code(), None);
        assert!(!db.persistence_enabled());
    }

    #[test]
    fn platform_directory_is_namespaced_by_app_and_project() {
        let db = firestore_with(FirestoreSettings::default());

        if let Some(dir) = db.persistence_dir() {
            assert!(dir.ends_with("firebase-bootstrap/_DEFAULT_/stock-divi"));
        }
    }
}
