//! Error types for `tether-core`.

use thiserror::Error;

use crate::contact::ContactId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("either email or phoneNumber must be provided")]
  InvalidRequest,

  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),

  /// Seeds were found but the expanded identity group held no live contacts.
  #[error("identity group seeded from contact {0} has no live members")]
  InternalConsistency(ContactId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error raised during a resolver step.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
