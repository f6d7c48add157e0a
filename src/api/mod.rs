//! Framework integrations.

#[cfg(feature = "actix")]
pub mod actix;
