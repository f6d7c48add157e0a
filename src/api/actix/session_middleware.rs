//! Session middleware for actix-web.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::HttpMessage;
use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::{Cookie, SameSite as ActixSameSite};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures::future::{LocalBoxFuture, Ready, ok};

use super::session_extractor::SharedSession;
use crate::{CookieDirective, SameSite, SessionCookie, SessionInterface, SessionStore};

/// Opens the session before the handler runs and saves it afterwards.
///
/// The session is reachable from handlers through the [`SharedSession`]
/// extractor. Every response carries the session cookie, or a removal
/// cookie when the handler destroyed the session.
///
/// # Example
///
/// ```rust,ignore
/// use shared_session::api::actix::SharedSessionMiddleware;
/// use shared_session::{RedisSessionStore, SessionConfig, SessionInterface};
///
/// let store = RedisSessionStore::connect("redis://127.0.0.1:6379/12").await?;
/// let sessions = SharedSessionMiddleware::new(SessionInterface::try_new(store, config)?);
///
/// HttpServer::new(move || App::new().wrap(sessions.clone()).configure(routes))
/// ```
pub struct SharedSessionMiddleware<St: SessionStore> {
    interface: Arc<SessionInterface<St>>,
}

impl<St: SessionStore> SharedSessionMiddleware<St> {
    #[must_use]
    pub fn new(interface: SessionInterface<St>) -> Self {
        Self::from_arc(Arc::new(interface))
    }

    #[must_use]
    pub fn from_arc(interface: Arc<SessionInterface<St>>) -> Self {
        Self { interface }
    }
}

impl<St: SessionStore> Clone for SharedSessionMiddleware<St> {
    fn clone(&self) -> Self {
        Self {
            interface: Arc::clone(&self.interface),
        }
    }
}

impl<S, B, St> Transform<S, ServiceRequest> for SharedSessionMiddleware<St>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
    St: SessionStore + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = SharedSessionService<S, St>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SharedSessionService {
            service: Rc::new(service),
            interface: Arc::clone(&self.interface),
        })
    }
}

/// The actual middleware service.
pub struct SharedSessionService<S, St: SessionStore> {
    service: Rc<S>,
    interface: Arc<SessionInterface<St>>,
}

impl<S, B, St> Service<ServiceRequest> for SharedSessionService<S, St>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
    St: SessionStore + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let interface = Arc::clone(&self.interface);

        Box::pin(async move {
            let cookie_value = req
                .cookie(&interface.config().cookie_name)
                .map(|cookie| cookie.value().to_owned());

            let session = interface.open_session(cookie_value.as_deref()).await?;
            let shared = SharedSession::new(session);
            req.extensions_mut().insert(shared.clone());

            let mut res = service.call(req).await?;

            let Some(mut session) = shared.take() else {
                return Ok(res);
            };

            let directive = interface.save_session(&mut session).await?;
            res.response_mut()
                .add_cookie(&build_cookie(&directive))
                .map_err(actix_web::error::ErrorInternalServerError)?;

            Ok(res)
        })
    }
}

fn build_cookie(directive: &CookieDirective) -> Cookie<'static> {
    let SessionCookie {
        name,
        value,
        path,
        domain,
        expires,
        http_only,
        secure,
        same_site,
    } = directive.cookie().clone();

    let same_site = match same_site {
        SameSite::None => ActixSameSite::None,
        SameSite::Lax => ActixSameSite::Lax,
        SameSite::Strict => ActixSameSite::Strict,
    };

    let mut cookie = Cookie::build(name, value)
        .path(path)
        .secure(secure)
        .http_only(http_only)
        .same_site(same_site)
        .finish();

    if let Some(domain) = domain {
        cookie.set_domain(domain);
    }

    match directive {
        CookieDirective::Remove(_) => cookie.make_removal(),
        CookieDirective::Set(_) => {
            if let Some(expires) = expires
                .and_then(|at| OffsetDateTime::from_unix_timestamp(at.timestamp()).ok())
            {
                cookie.set_expires(expires);
            }
        }
    }

    cookie
}
