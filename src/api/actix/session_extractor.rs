//! Handler-side access to the request's session.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures::future::{Ready, ready};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Session, SessionError};

/// Session extractor.
///
/// Requires [`SharedSessionMiddleware`](super::SharedSessionMiddleware) to be
/// installed; the middleware persists whatever the handler leaves behind.
/// When sessions are unavailable (no secret key), reads return nothing and
/// writes fail with [`SessionError::Unavailable`].
///
/// # Example
///
/// ```rust,ignore
/// async fn login(session: SharedSession, form: web::Form<LoginForm>) -> actix_web::Result<HttpResponse> {
///     let user = users.attempt_login(&form.email, &form.password)?;
///     session.regenerate()?;
///     session.insert("username", &user.email)?;
///     session.set_groups(user.groups.iter().cloned())?;
///     Ok(HttpResponse::SeeOther().insert_header(("Location", "/app")).finish())
/// }
/// ```
#[derive(Clone)]
pub struct SharedSession(Rc<RefCell<Option<Session>>>);

impl SharedSession {
    pub(crate) fn new(session: Option<Session>) -> Self {
        Self(Rc::new(RefCell::new(session)))
    }

    pub(crate) fn take(&self) -> Option<Session> {
        self.0.borrow_mut().take()
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R, SessionError> {
        self.0
            .borrow_mut()
            .as_mut()
            .map(f)
            .ok_or(SessionError::Unavailable)
    }

    pub fn is_available(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn sid(&self) -> Option<String> {
        self.0.borrow().as_ref()?.sid().map(ToOwned::to_owned)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        match self.0.borrow().as_ref() {
            Some(session) => session.get(key),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0
            .borrow()
            .as_ref()
            .is_some_and(|session| session.contains_key(key))
    }

    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        self.with_mut(|session| session.insert(key, value))??;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.with_mut(|session| session.remove(key)).ok().flatten()
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.with_mut(Session::clear)
    }

    pub fn groups(&self) -> BTreeSet<String> {
        self.0
            .borrow()
            .as_ref()
            .map(Session::groups)
            .unwrap_or_default()
    }

    pub fn set_groups<I, G>(&self, groups: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        self.with_mut(|session| session.set_groups(groups))
    }

    /// Issues a new session id; the old id's keys are deleted on save.
    pub fn regenerate(&self) -> Result<(), SessionError> {
        self.with_mut(|session| {
            session.regenerate();
        })
    }

    /// Ends the session; its keys are deleted and the cookie removed on save.
    pub fn destroy(&self) -> Result<(), SessionError> {
        self.with_mut(|session| {
            session.destroy();
        })
    }
}

impl FromRequest for SharedSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let shared = req.extensions().get::<SharedSession>().cloned();

        ready(shared.ok_or_else(|| {
            log::error!(
                target: "shared_session::actix",
                "msg=\"SharedSession extracted without SharedSessionMiddleware\""
            );
            SessionError::Configuration("SharedSessionMiddleware is not installed".to_owned())
                .into()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_and_writes() {
        let shared = SharedSession::new(Some(Session::new("sid", true)));

        shared.insert("username", "joe@gmail.com").unwrap();
        shared.set_groups(["one", "three"]).unwrap();

        assert!(shared.is_available());
        assert_eq!(shared.sid().as_deref(), Some("sid"));
        assert_eq!(
            shared.get::<String>("username").unwrap().as_deref(),
            Some("joe@gmail.com")
        );
        assert_eq!(shared.groups().len(), 2);
        assert!(shared.remove("username").is_some());
        assert!(!shared.contains_key("username"));

        let session = shared.take().unwrap();
        assert!(session.is_modified());
        assert!(shared.take().is_none());
    }

    #[test]
    fn test_unavailable_session() {
        let shared = SharedSession::new(None);

        assert!(!shared.is_available());
        assert_eq!(shared.get::<String>("username").unwrap(), None);
        assert_eq!(
            shared.insert("username", "joe@gmail.com"),
            Err(SessionError::Unavailable)
        );
        assert!(shared.regenerate().is_err());
        assert!(shared.groups().is_empty());
        assert_eq!(shared.destroy(), Err(SessionError::Unavailable));
    }

    #[test]
    fn test_regenerate_and_destroy() {
        let shared = SharedSession::new(Some(Session::new("sid", true)));

        shared.regenerate().unwrap();
        assert_ne!(shared.sid().as_deref(), Some("sid"));

        shared.destroy().unwrap();
        assert!(shared.sid().is_none());
        assert!(shared.is_available());
    }
}
