//! Stateless session credentials.
//!
//! A credential is a compact HS256 JWT: `base64url(header).base64url(claims).base64url(mac)`.
//! Nothing is stored server-side; validity is decided entirely by [`verify_token`]
//! from the token, the signing key, and the current time.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const ALG: &str = "HS256";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid signing key")]
    Key,

    #[error("claims encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: String,
}

/// Claims carried by a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// Opaque signed token handed to the session transport.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCredential([REDACTED])")
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encode(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn b64d_json<T: DeserializeOwned>(s: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD.decode(s).map_err(|_| TokenError::Format)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Format)
}

fn mac_for(key: &[u8], signing_input: &str) -> Result<HmacSha256, TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TokenError::Key)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Sign `claims` with `key`.
pub fn sign_token(claims: &Claims, key: &[u8]) -> Result<String, TokenError> {
    let header = Header {
        alg: ALG.to_string(),
        typ: "JWT".to_string(),
    };
    let signing_input = format!("{}.{}", b64e_json(&header)?, b64e_json(claims)?);
    let signature = mac_for(key, &signing_input)?.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify a token and return its claims.
///
/// Rejects malformed tokens, any algorithm other than HS256, bad signatures,
/// and tokens whose `exp` is not after `now`.
pub fn verify_token(token: &str, key: &[u8], now: u64) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Format);
    };

    let header: Header = b64d_json(header_b64)?;
    if header.alg != ALG {
        return Err(TokenError::UnsupportedAlg(header.alg));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| TokenError::Format)?;
    let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
    // verify_slice compares in constant time
    mac_for(key, signing_input)?
        .verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: Claims = b64d_json(claims_b64)?;
    if claims.exp <= now {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// Issues and verifies session credentials with the process-wide key.
pub struct TokenSigner {
    key: Zeroizing<Vec<u8>>,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(key: impl Into<Vec<u8>>, ttl_secs: u64) -> Self {
        TokenSigner {
            key: Zeroizing::new(key.into()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a credential for `user_id`, valid from `now` for the configured TTL.
    pub fn issue(&self, user_id: &str, now: u64) -> Result<SessionCredential, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        sign_token(&claims, &self.key).map(SessionCredential)
    }

    pub fn verify(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        verify_token(token, &self.key, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-signing-key-that-is-32-bytes!!";
    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new(KEY, 3600);
        let credential = signer.issue("user123", NOW).unwrap();

        assert_eq!(credential.as_str().split('.').count(), 3);

        let claims = signer.verify(credential.as_str(), NOW + 10).unwrap();
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn test_expired() {
        let signer = TokenSigner::new(KEY, 60);
        let credential = signer.issue("user123", NOW).unwrap();

        assert!(signer.verify(credential.as_str(), NOW + 59).is_ok());
        assert_eq!(
            signer.verify(credential.as_str(), NOW + 60),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_key() {
        let credential = TokenSigner::new(KEY, 60).issue("user123", NOW).unwrap();
        let other = TokenSigner::new(b"another-signing-key-of-32-bytes!!!".to_vec(), 60);

        assert_eq!(
            other.verify(credential.as_str(), NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_claims() {
        let signer = TokenSigner::new(KEY, 60);
        let credential = signer.issue("user123", NOW).unwrap();
        let parts: Vec<&str> = credential.as_str().split('.').collect();

        let forged = Claims {
            sub: "admin".to_string(),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = format!("{}.{}.{}", parts[0], b64e_json(&forged).unwrap(), parts[2]);

        assert_eq!(
            signer.verify(&token, NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_alg_none_rejected() {
        let header = Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: "user123".to_string(),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = format!("{}.{}.", b64e_json(&header).unwrap(), b64e_json(&claims).unwrap());

        assert_eq!(
            verify_token(&token, KEY, NOW),
            Err(TokenError::UnsupportedAlg("none".to_string()))
        );
    }

    #[test]
    fn test_malformed() {
        assert_eq!(verify_token("", KEY, NOW), Err(TokenError::Format));
        assert_eq!(verify_token("a.b", KEY, NOW), Err(TokenError::Format));
        assert_eq!(verify_token("a.b.c.d", KEY, NOW), Err(TokenError::Format));
        assert_eq!(verify_token("!!.??.**", KEY, NOW), Err(TokenError::Format));
    }

    #[test]
    fn test_debug_redacts() {
        let signer = TokenSigner::new(KEY, 60);
        let credential = signer.issue("user123", NOW).unwrap();

        assert!(!format!("{:?}", credential).contains(credential.as_str()));
        assert!(!format!("{:?}", signer).contains("test-signing-key"));
    }
}
