//! Framework-neutral description of the session cookie written on save.

use chrono::{DateTime, Utc};

use crate::SameSite;
use crate::SessionConfig;

/// What the host framework should do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    /// Set the cookie to the given value.
    Set(SessionCookie),
    /// Delete the cookie (the session was destroyed).
    Remove(SessionCookie),
}

impl CookieDirective {
    pub fn cookie(&self) -> &SessionCookie {
        match self {
            CookieDirective::Set(cookie) | CookieDirective::Remove(cookie) => cookie,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    /// `None` makes this a browser-session cookie.
    pub expires: Option<DateTime<Utc>>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SessionCookie {
    pub(crate) fn new(config: &SessionConfig, value: String) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value,
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            expires: None,
            http_only: config.cookie_http_only,
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
        }
    }

    /// Cookie that clears the session cookie on the client.
    ///
    /// Only the name, path and domain matter; the adapter applies the
    /// framework's removal attributes.
    pub(crate) fn removal(config: &SessionConfig) -> Self {
        Self::new(config, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_takes_attributes_from_config() {
        let config = SessionConfig {
            cookie_name: "session_cookie".to_owned(),
            cookie_domain: Some("example.com".to_owned()),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            ..Default::default()
        };
        let cookie = SessionCookie::new(&config, "abc.def".to_owned());

        assert_eq!(cookie.name, "session_cookie");
        assert_eq!(cookie.value, "abc.def");
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(cookie.expires, None);
        assert!(cookie.http_only);
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSite::Strict);
    }

    #[test]
    fn test_removal_cookie_is_empty() {
        let config = SessionConfig {
            cookie_name: "session_cookie".to_owned(),
            ..Default::default()
        };
        let directive = CookieDirective::Remove(SessionCookie::removal(&config));

        assert_eq!(directive.cookie().name, "session_cookie");
        assert!(directive.cookie().value.is_empty());
    }
}
