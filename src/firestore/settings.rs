use std::path::PathBuf;

const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";
const PERSISTENCE_DIR_VAR: &str = "FIRESTORE_PERSISTENCE_DIR";

/// Where the offline cache may live.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LocalStorage {
    /// The platform's local data directory.
    #[default]
    Platform,
    Directory(PathBuf),
    /// The environment has no storage for an offline cache.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub host_url: String,
    pub local_storage: LocalStorage,
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            host_url: "https://firestore.googleapis.com".to_string(),
            local_storage: LocalStorage::Platform,
        }
    }
}

impl FirestoreSettings {
    /// The default settings, adjusted by `FIRESTORE_EMULATOR_HOST` and
    /// `FIRESTORE_PERSISTENCE_DIR` when they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), with variables looked up by the
    /// given function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(host) = var(EMULATOR_HOST_VAR) {
            settings = settings.host_url(emulator_url(&host));
        }

        if let Some(dir) = var(PERSISTENCE_DIR_VAR) {
            settings = settings.persistence_dir(dir);
        }

        settings
    }

    pub fn host_url(mut self, host_url: impl Into<String>) -> Self {
        self.host_url = host_url.into();
        self
    }

    pub fn persistence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_storage = LocalStorage::Directory(dir.into());
        self
    }

    pub fn without_local_storage(mut self) -> Self {
        self.local_storage = LocalStorage::Unavailable;
        self
    }
}

/// The emulator speaks plain HTTP/2 and requires 127.0.0.1 rather than
/// localhost.
fn emulator_url(host: &str) -> String {
    let (name, port) = match host.split_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };
    let name = if name == "localhost" { "127.0.0.1" } else { name };

    match port {
        Some(port) => format!("http://{name}:{port}"),
        None => format!("http://{name}"),
    }
}
