//! Signed cookie helpers for session ids.
//!
//! The HMAC key is derived from the application secret and a salt, so
//! different applications sharing one secret produce different signatures.
//! A signed value has the form `{value}.{hex signature}`; the signature part
//! is what gets stored under the session's `signature` key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{SecretString, SessionError};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

#[derive(Clone)]
pub struct Signer {
    derived_key: Vec<u8>,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("derived_key", &"[REDACTED]").finish()
    }
}

impl Signer {
    /// Builds a signer from a secret and salt.
    ///
    /// Returns `None` for an empty secret.
    pub fn new(secret: &SecretString, salt: &str) -> Option<Self> {
        if secret.is_empty() {
            return None;
        }
        let derived_key = compute_hmac(secret.expose_secret().as_bytes(), salt.as_bytes());
        Some(Self { derived_key })
    }

    /// Returns the hex signature of `value`.
    pub fn signature(&self, value: &str) -> String {
        hex::encode(compute_hmac(&self.derived_key, value.as_bytes()))
    }

    /// Returns `{value}.{signature}`.
    pub fn sign(&self, value: &str) -> String {
        format!("{value}{SEPARATOR}{}", self.signature(value))
    }

    /// Verifies a signed value and returns the original value.
    pub fn unsign(&self, signed: &str) -> Result<String, SessionError> {
        let (value, signature_hex) = signed
            .rsplit_once(SEPARATOR)
            .ok_or(SessionError::BadSignature)?;

        let signature = hex::decode(signature_hex).map_err(|_| SessionError::BadSignature)?;

        let mut mac = new_mac(&self.derived_key);
        mac.update(value.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        Ok(value.to_owned())
    }

    /// Splits the detached signature off a signed value.
    pub fn detach(signed: &str) -> Option<&str> {
        signed.rsplit_once(SEPARATOR).map(|(_, signature)| signature)
    }
}

#[allow(clippy::expect_used)]
fn new_mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size")
}

fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
