use firestore_grpc::tonic;

#[derive(thiserror::Error)]
pub enum FirebaseError {
    /// The app was initialised without an option that the requested service
    /// needs. Holds the option's name as it appears in the web config.
    #[error("\"{0}\" not provided in initialize_app")]
    MissingOption(&'static str),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Offline persistence could not be enabled. The code follows the
    /// Firestore error codes, e.g. `FailedPrecondition` or `Unimplemented`.
    #[error("persistence ({code:?}): {message}")]
    Persistence { code: tonic::Code, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FirebaseError {
    pub(crate) fn persistence(code: tonic::Code, message: impl Into<String>) -> Self {
        FirebaseError::Persistence {
            code,
            message: message.into(),
        }
    }

    /// The Firestore error code of a persistence failure, if this is one.
    pub fn persistence_code(&self) -> Option<tonic::Code> {
        match self {
            FirebaseError::Persistence { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Debug for FirebaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

// Taken from https://www.lpalmieri.com/posts/error-handling-rust/#internal-errors
fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
