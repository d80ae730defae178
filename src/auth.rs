//! Registry authentication descriptors and registry key derivation.
//!
//! npm scopes credentials to a registry by prefixing config keys with a
//! protocol-less registry URL (`//registry.npmjs.org/:_authToken`). This module
//! builds those keys from a host rule's `match_host`, and the yarn berry
//! descriptors stored under `npmRegistries` in `.yarnrc.yml`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use url::Url;

/// Authentication for one entry of yarn's `npmRegistries` map.
///
/// # Security Notes
///
/// The `Debug` implementation redacts the secret to prevent accidental
/// credential leakage in logs.
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// Bearer token (`npmAuthToken`).
    Token(String),

    /// Basic auth identity (`npmAuthIdent`), either `username:password` or a
    /// pre-encoded basic auth string.
    Ident(String),
}

// Serialized as a plain single-entry map; a derived enum would become a YAML tag.
impl Serialize for RegistryAuth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.yarn_key(), self.secret())?;
        map.end()
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryAuth::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
            RegistryAuth::Ident(_) => f.debug_tuple("Ident").field(&"[REDACTED]").finish(),
        }
    }
}

impl RegistryAuth {
    /// The `.yarnrc.yml` field this auth is written to.
    pub fn yarn_key(&self) -> &'static str {
        match self {
            RegistryAuth::Token(_) => "npmAuthToken",
            RegistryAuth::Ident(_) => "npmAuthIdent",
        }
    }

    /// The token or identity, whichever this is.
    pub fn secret(&self) -> &str {
        match self {
            RegistryAuth::Token(secret) | RegistryAuth::Ident(secret) => secret,
        }
    }

    /// Get the token if this is token-based auth.
    pub fn token(&self) -> Option<&str> {
        match self {
            RegistryAuth::Token(token) => Some(token),
            RegistryAuth::Ident(_) => None,
        }
    }

    /// Get the basic auth identity if this is ident-based auth.
    pub fn ident(&self) -> Option<&str> {
        match self {
            RegistryAuth::Ident(ident) => Some(ident),
            RegistryAuth::Token(_) => None,
        }
    }
}

/// Registry keys derived from a host rule's `match_host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUri {
    /// `//{match_host}/`, used verbatim as a yarn registry key.
    pub uri: String,
    /// Protocol-less form used for `.npmrc` keys.
    pub cleaned: String,
}

impl RegistryUri {
    /// Derive the registry keys for `match_host`.
    ///
    /// For http(s) URLs the cleaned form is the URL with its scheme stripped;
    /// bare hosts become `//{host}/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use npm_hostrules::RegistryUri;
    ///
    /// let bare = RegistryUri::from_match_host("registry.company.com");
    /// assert_eq!(bare.cleaned, "//registry.company.com/");
    /// assert_eq!(bare.uri, "//registry.company.com/");
    ///
    /// let url = RegistryUri::from_match_host("https://registry.npmjs.org");
    /// assert_eq!(url.cleaned, "//registry.npmjs.org");
    /// assert_eq!(url.uri, "//https://registry.npmjs.org/");
    /// ```
    pub fn from_match_host(match_host: &str) -> Self {
        let uri = format!("//{}/", match_host);
        let cleaned = if is_http_url(match_host) {
            strip_http_scheme(match_host).to_string()
        } else {
            uri.clone()
        };
        RegistryUri { uri, cleaned }
    }

    /// Distinct yarn registry keys: the cleaned form, then the raw form.
    pub fn yarn_keys(&self) -> Vec<&str> {
        if self.uri == self.cleaned {
            vec![self.cleaned.as_str()]
        } else {
            vec![self.cleaned.as_str(), self.uri.as_str()]
        }
    }

    /// Build an `.npmrc` line for `key` under this registry.
    pub fn npmrc_line(&self, key: &str, value: &str) -> String {
        format!("{}:{}={}", self.cleaned, key, value)
    }
}

/// Check whether a value parses as an `http` or `https` URL.
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn strip_http_scheme(value: &str) -> &str {
    value
        .strip_prefix("https:")
        .or_else(|| value.strip_prefix("http:"))
        .unwrap_or(value)
}

/// Encode a password for the `.npmrc` `_password` field.
pub fn encode_password(password: &str) -> String {
    BASE64.encode(password.as_bytes())
}
