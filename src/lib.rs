//! Server-side sessions shared between a web application and an edge proxy.
//!
//! Session state lives in a key-value store under three keys per session:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `<prefix>:data:<sid>` | JSON-serialized session mapping |
//! | `<prefix>:signature:<sid>` | detached signature of the session cookie |
//! | `<prefix>:groups:<sid>` | set of group tokens, read by the proxy for cache partitioning |
//!
//! All three share one TTL and are written in a single atomic pipeline.
//!
//! # Features
//!
//! - `redis_store` (default): [`RedisSessionStore`](session::RedisSessionStore)
//! - `actix`: middleware and extractor for actix-web
//! - `tracing`: spans on session interface operations

pub mod api;
pub mod config;
pub mod cookie;
mod error;
mod secret;
pub mod session;
pub mod signer;

pub use config::{SameSite, SessionConfig};
pub use cookie::{CookieDirective, SessionCookie};
pub use error::SessionError;
pub use secret::SecretString;
pub use session::{
    InMemorySessionStore, Session, SessionInterface, SessionKeys, SessionRecord, SessionStore,
};
pub use signer::Signer;

#[cfg(feature = "redis_store")]
pub use session::RedisSessionStore;
