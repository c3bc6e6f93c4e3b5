use std::collections::BTreeMap;

/// Describes sign-in with Google. Hand it to downstream sign-in flows, or turn
/// a Google token into an [`OAuthCredential`] for
/// [`Auth::sign_in_with_credential`](super::Auth::sign_in_with_credential).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleAuthProvider {
    scopes: Vec<String>,
    custom_parameters: BTreeMap<String, String>,
}

/// A credential issued by an identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredential {
    pub provider_id: String,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

impl GoogleAuthProvider {
    pub const PROVIDER_ID: &'static str = "google.com";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider_id(&self) -> &str {
        Self::PROVIDER_ID
    }

    /// Requests an additional OAuth scope. Adding a scope twice has no effect.
    pub fn add_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Replaces the custom OAuth parameters, e.g. `prompt=select_account`.
    pub fn set_custom_parameters<K, V>(
        &mut self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_parameters = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn custom_parameters(&self) -> &BTreeMap<String, String> {
        &self.custom_parameters
    }

    /// Wraps a Google ID token and/or access token obtained elsewhere.
    pub fn credential(id_token: Option<String>, access_token: Option<String>) -> OAuthCredential {
        OAuthCredential {
            provider_id: Self::PROVIDER_ID.to_string(),
            id_token,
            access_token,
        }
    }
}

impl OAuthCredential {
    /// The url-encoded `postBody` expected by `signInWithIdp`.
    pub(crate) fn post_body(&self) -> String {
        let mut body = url::form_urlencoded::Serializer::new(String::new());

        if let Some(id_token) = &self.id_token {
            body.append_pair("id_token", id_token);
        }
        if let Some(access_token) = &self.access_token {
            body.append_pair("access_token", access_token);
        }
        body.append_pair("providerId", &self.provider_id);

        body.finish()
    }
}

impl std::fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("provider_id", &self.provider_id)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_google() {
        let provider = GoogleAuthProvider::new();
        assert_eq!(provider.provider_id(), "google.com");
        assert!(provider.scopes().is_empty());
        assert!(provider.custom_parameters().is_empty());
    }

    #[test]
    fn scopes_are_deduplicated() {
        let mut provider = GoogleAuthProvider::new();
        provider
            .add_scope("https://www.googleapis.com/auth/contacts.readonly")
            .add_scope("https://www.googleapis.com/auth/contacts.readonly")
            .add_scope("email");

        assert_eq!(
            provider.scopes(),
            ["https://www.googleapis.com/auth/contacts.readonly", "email"]
        );
    }

    #[test]
    fn custom_parameters_are_replaced() {
        let mut provider = GoogleAuthProvider::new();
        provider.set_custom_parameters([("login_hint", "alice@example.com")]);
        provider.set_custom_parameters([("prompt", "select_account")]);

        assert_eq!(
            provider.custom_parameters().get("prompt").map(String::as_str),
            Some("select_account")
        );
        assert_eq!(provider.custom_parameters().len(), 1);
    }

    #[test]
    fn post_body_is_url_encoded() {
        let credential = GoogleAuthProvider::credential(
            Some("a.b+c/d=".to_string()),
            Some("ya29 x".to_string()),
        );

        assert_eq!(
            credential.post_body(),
            "id_token=a.b%2Bc%2Fd%3D&access_token=ya29+x&providerId=google.com"
        );
    }

    #[test]
    fn post_body_skips_missing_tokens() {
        let credential = GoogleAuthProvider::credential(None, Some("token".to_string()));
        assert_eq!(credential.post_body(), "access_token=token&providerId=google.com");
    }
}
