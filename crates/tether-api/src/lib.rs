//! JSON REST API for Tether.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tether_core::store::IdentityStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tether_api::api_router(store.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod extract;
pub mod health;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tether_core::store::IdentityStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IdentityStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/contacts", get(contacts::list::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .route("/health", get(health::handler))
    .with_state(store)
}
