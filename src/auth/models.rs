use std::collections::HashSet;

use anyhow::Context;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

use crate::error::FirebaseError;

/// The signed-in user, as returned by the Identity Toolkit.
///
/// `Debug` leaves out the tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// `password` for email sign-ins, otherwise the identity provider, e.g.
    /// `google.com`.
    pub provider_id: String,
    pub is_new_user: bool,
    pub(crate) id_token: String,
    pub(crate) refresh_token: String,
}

/// Claims carried by a Firebase ID token.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    /// The user's UID.
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub firebase: Option<FirebaseClaims>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FirebaseClaims {
    pub sign_in_provider: String,
}

impl User {
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Decodes the claims of the user's ID token.
    ///
    /// The signature is not checked: the token came straight from Google and
    /// is only read here, the same way the web SDK's `getIdTokenResult` does.
    /// Servers that receive the token must verify it themselves.
    pub fn id_token_claims(&self) -> Result<IdTokenClaims, FirebaseError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let decoded = jsonwebtoken::decode::<IdTokenClaims>(
            &self.id_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .context("Failed to decode ID token claims")?;

        Ok(decoded.claims)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("provider_id", &self.provider_id)
            .field("is_new_user", &self.is_new_user)
            .finish_non_exhaustive()
    }
}

/// Common shape of the `signUp`, `signInWithPassword` and `signInWithIdp`
/// responses. Only the fields we keep are listed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    email: Option<String>,
    display_name: Option<String>,
    provider_id: Option<String>,
    is_new_user: Option<bool>,
}

impl SignInResponse {
    pub(crate) fn into_user(self, default_provider: &str, new_user: bool) -> User {
        User {
            uid: self.local_id,
            email: self.email.filter(|e| !e.is_empty()),
            display_name: self.display_name.filter(|n| !n.is_empty()),
            provider_id: self
                .provider_id
                .unwrap_or_else(|| default_provider.to_string()),
            is_new_user: self.is_new_user.unwrap_or(new_user),
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}
