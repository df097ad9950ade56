//! Core types and the identity resolver for the Tether reconciliation
//! service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ContactStore`] and
//! [`store::IdentityStore`]; everything above them depends only on these
//! traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod identity;
pub mod memory;
pub mod resolve;
pub mod store;

pub use error::{Error, Result};
