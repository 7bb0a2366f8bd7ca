//! Session transport: carries the credential between server and client.
//!
//! The service hands an opaque [`SessionCredential`] to a [`SessionTransport`]
//! and never looks at how it travels. [`CookieTransport`] is the HTTP
//! implementation: it collects `Set-Cookie` headers for the outgoing response.

use super::token::SessionCredential;
use axum::http::{
    header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid cookie value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    #[error("Invalid cookie name: {0:?}")]
    InvalidName(String),
}

/// Cookie names are restricted to ASCII alphanumerics, `-` and `_`.
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Collaborator that attaches or clears the credential on a response.
pub trait SessionTransport {
    fn issue(&mut self, credential: &SessionCredential) -> Result<(), TransportError>;

    fn clear(&mut self) -> Result<(), TransportError>;
}

/// Cookie attributes, fixed per deployment.
///
/// Only constructible through [`CookieSettings::new`], so a settings value
/// always yields a valid `Set-Cookie` header for any signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    name: String,
    secure: bool,
    /// Matches the credential lifetime.
    max_age_secs: u64,
}

impl CookieSettings {
    pub fn new(
        name: impl Into<String>,
        secure: bool,
        max_age_secs: u64,
    ) -> Result<Self, TransportError> {
        let name = name.into();
        if !is_valid_cookie_name(&name) {
            return Err(TransportError::InvalidName(name));
        }
        Ok(CookieSettings {
            name,
            secure,
            max_age_secs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self, max_age_secs: u64) -> String {
        let mut attrs = format!("Path=/; HttpOnly; SameSite=Lax; Max-Age={}", max_age_secs);
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs
    }

    /// `Set-Cookie` value carrying the token.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, TransportError> {
        let cookie = format!("{}={}; {}", self.name, token, self.attributes(self.max_age_secs));
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// `Set-Cookie` value that makes the client drop the cookie.
    pub fn clear_cookie(&self) -> Result<HeaderValue, TransportError> {
        let cookie = format!("{}=; {}", self.name, self.attributes(0));
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Read the credential a client presented.
    ///
    /// The session cookie wins; an `Authorization: Bearer` header is accepted
    /// as a fallback for non-browser clients.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((key, val)) = pair.trim().split_once('=') else {
                    continue;
                };
                let val = val.trim();
                if key.trim() == self.name && !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
        extract_bearer_token(headers)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Collects `Set-Cookie` headers for one response.
pub struct CookieTransport<'a> {
    settings: &'a CookieSettings,
    headers: HeaderMap,
}

impl<'a> CookieTransport<'a> {
    pub fn new(settings: &'a CookieSettings) -> Self {
        CookieTransport {
            settings,
            headers: HeaderMap::new(),
        }
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

impl SessionTransport for CookieTransport<'_> {
    fn issue(&mut self, credential: &SessionCredential) -> Result<(), TransportError> {
        let cookie = self.settings.session_cookie(credential.as_str())?;
        self.headers.insert(SET_COOKIE, cookie);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        let cookie = self.settings.clear_cookie()?;
        self.headers.insert(SET_COOKIE, cookie);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenSigner;

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings::new("token", secure, 3600).unwrap()
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", "bad\nname", "session id", "a;b", "tok=en", "caf\u{e9}"] {
            assert!(
                matches!(
                    CookieSettings::new(name, true, 3600),
                    Err(TransportError::InvalidName(_))
                ),
                "accepted {:?}",
                name
            );
        }
        assert_eq!(CookieSettings::new("sid_v2-x", false, 60).unwrap().name(), "sid_v2-x");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = settings(true).session_cookie("abc.def.ghi").unwrap();
        assert_eq!(
            cookie,
            "token=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure"
        );

        let cookie = settings(false).session_cookie("abc.def.ghi").unwrap();
        assert!(!cookie.to_str().unwrap().contains("Secure"));
        assert!(cookie.to_str().unwrap().contains("HttpOnly"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = settings(true).clear_cookie().unwrap();
        assert_eq!(
            cookie,
            "token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
    }

    #[test]
    fn test_transport_issue_then_clear() {
        let settings = settings(false);
        let credential = TokenSigner::new(b"k".repeat(32), 60)
            .issue("user1", 1_700_000_000)
            .unwrap();

        let mut transport = CookieTransport::new(&settings);
        transport.issue(&credential).unwrap();
        transport.clear().unwrap();
        let headers = transport.into_headers();

        // Last directive wins
        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 1);
        assert!(values[0].to_str().unwrap().starts_with("token=;"));
    }

    #[test]
    fn test_extract_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=abc.def.ghi; other=1"),
        );
        assert_eq!(
            settings(true).extract(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn test_extract_ignores_similar_names_and_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("xtoken=nope; token="));
        assert_eq!(settings(true).extract(&headers), None);
    }

    #[test]
    fn test_extract_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            settings(true).extract(&headers),
            Some("abc.def.ghi".to_string())
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(settings(true).extract(&headers), None);
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(settings(true).extract(&HeaderMap::new()), None);
    }
}
