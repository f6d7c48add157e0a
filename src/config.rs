//! Session configuration.
//!
//! # Example
//!
//! ```rust
//! use shared_session::{SecretString, SessionConfig};
//! use chrono::Duration;
//!
//! let config = SessionConfig {
//!     cookie_name: "app_session_cookie".to_owned(),
//!     key_prefix: "app_session_prefix".to_owned(),
//!     salt: "app_session_salt".to_owned(),
//!     secret_key: SecretString::new("fishes"),
//!     permanent_session_lifetime: Duration::hours(12),
//!     ..Default::default()
//! };
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.ttl_seconds(), 43_200);
//! ```

use chrono::Duration;

use crate::{SecretString, SessionError, Signer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    #[default]
    Lax,
    Strict,
}

/// Settings shared by the session interface, the stores and the cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the (signed) session id.
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,

    /// Lifetime of permanent session cookies and TTL of every stored key.
    ///
    /// Default: 31 days
    pub permanent_session_lifetime: Duration,

    /// Key the cookie signer derives its HMAC key from.
    pub secret_key: SecretString,

    /// Salt mixed into the signer's key derivation.
    pub salt: String,

    /// Prefix of all store keys, e.g. `"session"` gives `session:data:<sid>`.
    pub key_prefix: String,

    /// Sign the session id in the cookie. Disabling this stores an empty
    /// signature and trusts any id the client sends.
    pub use_signer: bool,

    /// Whether newly created sessions are permanent.
    pub permanent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: false,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            permanent_session_lifetime: Duration::days(31),
            secret_key: SecretString::default(),
            salt: "shared-session".to_owned(),
            key_prefix: "session".to_owned(),
            use_signer: true,
            permanent: true,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values and the given secret.
    pub fn new(secret_key: impl Into<SecretString>) -> Self {
        Self {
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    /// Production-leaning settings: secure, strict same-site cookies.
    pub fn strict(secret_key: impl Into<SecretString>) -> Self {
        Self {
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            permanent_session_lifetime: Duration::hours(12),
            ..Self::new(secret_key)
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.key_prefix.is_empty() {
            return Err(SessionError::Configuration(
                "key_prefix must not be empty".to_owned(),
            ));
        }
        if self.cookie_name.is_empty() {
            return Err(SessionError::Configuration(
                "cookie_name must not be empty".to_owned(),
            ));
        }
        if self.ttl_seconds() == 0 {
            return Err(SessionError::Configuration(
                "permanent_session_lifetime must be at least one second".to_owned(),
            ));
        }
        if self.use_signer && self.secret_key.is_empty() {
            return Err(SessionError::Configuration(
                "secret_key must not be empty when use_signer is enabled".to_owned(),
            ));
        }
        Ok(())
    }

    /// TTL of the stored session keys in whole seconds.
    #[inline]
    pub fn ttl_seconds(&self) -> u64 {
        u64::try_from(self.permanent_session_lifetime.num_seconds()).unwrap_or(0)
    }

    /// Builds the cookie signer, or `None` when no secret is configured.
    pub fn signer(&self) -> Option<Signer> {
        Signer::new(&self.secret_key, &self.salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.cookie_path, "/");
        assert_eq!(config.key_prefix, "session");
        assert!(config.use_signer);
        assert!(config.permanent);
        assert!(config.cookie_http_only);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
        assert_eq!(config.ttl_seconds(), 31 * 86_400);
    }

    #[test]
    fn test_validate_requires_secret_when_signing() {
        let config = SessionConfig::default();
        assert!(config.validate().is_err());

        let unsigned = SessionConfig {
            use_signer: false,
            ..Default::default()
        };
        assert!(unsigned.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let config = SessionConfig {
            key_prefix: String::new(),
            ..SessionConfig::new("secret")
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_lifetime() {
        let config = SessionConfig {
            permanent_session_lifetime: Duration::zero(),
            ..SessionConfig::new("secret")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_sub_second_lifetime() {
        let config = SessionConfig {
            permanent_session_lifetime: Duration::milliseconds(500),
            ..SessionConfig::new("secret")
        };
        assert_eq!(config.ttl_seconds(), 0);
        assert_eq!(
            config.validate(),
            Err(SessionError::Configuration(
                "permanent_session_lifetime must be at least one second".to_owned()
            ))
        );

        let config = SessionConfig {
            permanent_session_lifetime: Duration::seconds(1),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_drops_sub_second_part() {
        let config = SessionConfig {
            permanent_session_lifetime: Duration::days(1)
                + Duration::seconds(5)
                + Duration::milliseconds(900),
            ..Default::default()
        };
        assert_eq!(config.ttl_seconds(), 86_405);
    }

    #[test]
    fn test_strict_preset() {
        let config = SessionConfig::strict("secret");
        assert!(config.cookie_secure);
        assert_eq!(config.cookie_same_site, SameSite::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signer_requires_secret() {
        assert!(SessionConfig::default().signer().is_none());
        assert!(SessionConfig::new("secret").signer().is_some());
    }
}
