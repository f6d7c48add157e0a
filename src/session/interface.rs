//! Opening and saving sessions around a request.

use chrono::Utc;
use serde_json::{Map, Value};

use super::store::{SessionRecord, SessionStore};
use super::{Session, SessionKeys};
use crate::cookie::{CookieDirective, SessionCookie};
use crate::{SessionConfig, SessionError, Signer};

/// Connects the host framework's request/response cycle to a
/// [`SessionStore`].
///
/// - [`open_session`](Self::open_session) turns the incoming cookie into a
///   [`Session`]
/// - [`save_session`](Self::save_session) writes it back and says which cookie
///   to send
pub struct SessionInterface<S: SessionStore> {
    store: S,
    config: SessionConfig,
    signer: Option<Signer>,
}

impl<S: SessionStore> SessionInterface<S> {
    /// Builds the interface without rejecting an invalid configuration.
    ///
    /// A missing secret leaves sessions unavailable and a lifetime under one
    /// second makes every save fail; both are logged here. Prefer
    /// [`try_new`](Self::try_new).
    pub fn new(store: S, config: SessionConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!(
                target: "shared_session",
                "msg=\"invalid session configuration\" error=\"{e}\""
            );
        }
        let signer = config.signer();
        Self {
            store,
            config,
            signer,
        }
    }

    /// Like [`new`](Self::new) but rejects an invalid configuration.
    pub fn try_new(store: S, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self::new(store, config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self, sid: &str) -> SessionKeys {
        SessionKeys::new(&self.config.key_prefix, sid)
    }

    /// Opens the session named by the request cookie.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))` - the stored session, or a fresh one when the cookie is
    ///   missing, fails verification, or names nothing readable
    /// - `Ok(None)` - signing is enabled but no secret is configured
    /// - `Err(_)` - the store failed
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "open_session", skip_all, err)
    )]
    pub async fn open_session(&self, cookie: Option<&str>) -> Result<Option<Session>, SessionError> {
        let permanent = self.config.permanent;

        if self.config.use_signer && self.signer.is_none() {
            return Ok(None);
        }

        let Some(cookie) = cookie.filter(|value| !value.is_empty()) else {
            return Ok(Some(Session::fresh(permanent)));
        };

        let sid = match self.signer.as_ref() {
            Some(signer) if self.config.use_signer => match signer.unsign(cookie) {
                Ok(sid) => sid,
                Err(_) => {
                    log::warn!(
                        target: "shared_session",
                        "msg=\"session cookie verification failed\" cookie_prefix=\"{}...\"",
                        cookie.chars().take(8).collect::<String>()
                    );
                    return Ok(Some(Session::fresh(permanent)));
                }
            },
            _ => cookie.to_owned(),
        };

        let Some(payload) = self.store.load(&self.keys(&sid)).await? else {
            return Ok(Some(Session::new(sid, permanent)));
        };

        match serde_json::from_slice::<Map<String, Value>>(&payload) {
            Ok(data) => Ok(Some(Session::restore(sid, data, permanent))),
            Err(e) => {
                log::warn!(
                    target: "shared_session",
                    "msg=\"stored session data unreadable, starting empty\" error=\"{e}\""
                );
                Ok(Some(Session::new(sid, permanent)))
            }
        }
    }

    /// Gives the session a new id and deletes the keys of the old one.
    ///
    /// Call this on login so a session id issued before authentication
    /// cannot be reused after it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "regenerate_session", skip_all, err)
    )]
    pub async fn regenerate(&self, session: &mut Session) -> Result<(), SessionError> {
        session.regenerate();
        self.purge_retired(session).await
    }

    /// Deletes the session's keys and clears its id.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "destroy_session", skip_all, err)
    )]
    pub async fn destroy(&self, session: &mut Session) -> Result<(), SessionError> {
        session.destroy();
        self.purge_retired(session).await
    }

    /// Persists the session and returns the cookie to send.
    ///
    /// A destroyed session yields [`CookieDirective::Remove`]. Otherwise the
    /// data, signature and groups keys are rewritten with the configured TTL
    /// and the cookie is set on every response.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "save_session", skip_all, err)
    )]
    pub async fn save_session(&self, session: &mut Session) -> Result<CookieDirective, SessionError> {
        self.purge_retired(session).await?;

        let Some(sid) = session.sid() else {
            return Ok(CookieDirective::Remove(SessionCookie::removal(&self.config)));
        };

        let (cookie_value, signature) = if self.config.use_signer {
            let signer = self.signer.as_ref().ok_or(SessionError::Unavailable)?;
            let signed = signer.sign(sid);
            let signature = Signer::detach(&signed).unwrap_or_default().to_owned();
            (signed, signature)
        } else {
            (sid.to_owned(), String::new())
        };

        let record = SessionRecord {
            data: session.to_json()?,
            signature,
            groups: session.groups(),
        };

        self.store
            .save(&self.keys(sid), &record, self.config.ttl_seconds())
            .await?;

        let mut cookie = SessionCookie::new(&self.config, cookie_value);
        if session.is_permanent() {
            cookie.expires = Some(Utc::now() + self.config.permanent_session_lifetime);
        }

        Ok(CookieDirective::Set(cookie))
    }

    async fn purge_retired(&self, session: &mut Session) -> Result<(), SessionError> {
        for sid in session.take_retired() {
            self.store.delete(&self.keys(&sid)).await?;
            log::debug!(target: "shared_session", "msg=\"session keys deleted\"");
        }
        Ok(())
    }
}
