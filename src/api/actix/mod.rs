//! actix-web integration.
//!
//! Wrap the app in [`SharedSessionMiddleware`] and take [`SharedSession`] in
//! handlers:
//!
//! ```rust,ignore
//! use shared_session::api::actix::{SharedSession, SharedSessionMiddleware};
//!
//! async fn myself(session: SharedSession) -> actix_web::Result<HttpResponse> {
//!     let email: Option<String> = session.get("username")?;
//!     Ok(match email {
//!         Some(email) => HttpResponse::Ok().json(serde_json::json!({ "email": email })),
//!         None => HttpResponse::Unauthorized().finish(),
//!     })
//! }
//!
//! App::new()
//!     .wrap(SharedSessionMiddleware::new(SessionInterface::try_new(store, config)?))
//!     .route("/app/api/v1/myself", web::get().to(myself))
//! ```

mod error;
mod session_extractor;
mod session_middleware;

pub use session_extractor::SharedSession;
pub use session_middleware::{SharedSessionMiddleware, SharedSessionService};
