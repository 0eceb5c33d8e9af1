//! The seam to the external identity provider.
//!
//! Who is signed in is resolved outside this crate and arrives with each
//! request as an [`Identity`]. The provider only builds the login and logout
//! links shown on pages.

use crate::error::{AppError, AppResult};
use std::fmt;

/// An authenticated external identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable provider-assigned id.
    pub id: String,
    /// Human-readable form, e.g. an email address.
    pub display: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Builds login and logout links for the current request.
pub trait IdentityProvider: Send + Sync {
    /// Link that signs in and returns to `return_path`.
    fn login_url(&self, return_path: &str) -> AppResult<String>;

    /// Link that signs out and returns to `return_path`.
    fn logout_url(&self, return_path: &str) -> AppResult<String>;
}

/// Provider serving links under a fixed base path.
#[derive(Debug, Clone)]
pub struct LocalIdentityProvider {
    base: String,
}

impl LocalIdentityProvider {
    /// Links under `base`, e.g. `/_ah`.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn link(&self, action: &str, return_path: &str) -> AppResult<String> {
        if !return_path.starts_with('/') {
            return Err(AppError::Identity {
                reason: format!("return path must be absolute: {return_path:?}"),
            });
        }
        Ok(format!(
            "{}/{}?continue={}",
            self.base,
            action,
            encode_component(return_path)
        ))
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new("/_ah")
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn login_url(&self, return_path: &str) -> AppResult<String> {
        self.link("login", return_path)
    }

    fn logout_url(&self, return_path: &str) -> AppResult<String> {
        self.link("logout", return_path)
    }
}

/// Percent-encode everything outside the URL unreserved set.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = Identity::new("185804764220139124118", "test@example.com");
        assert_eq!(identity.to_string(), "test@example.com");
    }

    #[test]
    fn test_local_links() {
        let provider = LocalIdentityProvider::default();
        assert_eq!(
            provider.login_url("/guest").unwrap(),
            "/_ah/login?continue=%2Fguest"
        );
        assert_eq!(
            provider.logout_url("/guest?x=1").unwrap(),
            "/_ah/logout?continue=%2Fguest%3Fx%3D1"
        );
    }

    #[test]
    fn test_relative_return_path_rejected() {
        let provider = LocalIdentityProvider::default();
        assert!(matches!(
            provider.login_url("guest"),
            Err(AppError::Identity { .. })
        ));
    }
}
