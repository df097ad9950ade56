//! Storage traits.
//!
//! [`ContactStore`] is the synchronous, row-level interface the resolver
//! drives; one value of it represents a single unit of work (a database
//! transaction, or a private copy of an in-memory table).
//!
//! [`IdentityStore`] is what higher layers (`tether-api`, `tether-server`)
//! depend on. Each backend implements it by opening a unit of work, running
//! [`crate::resolve::identify`] inside it, and committing only on success.

use std::{collections::BTreeSet, future::Future};

use crate::{
  contact::{Contact, ContactId, LinkUpdate, NewContact},
  identity::{ConsolidatedIdentity, Identifiers},
};

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Row-level access to contacts within one transaction.
///
/// Every read excludes soft-deleted contacts.
pub trait ContactStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Contacts whose email equals `email` or whose phone number equals
  /// `phone_number`. An absent argument matches nothing. Ordered oldest
  /// first.
  fn find_by_exact_match(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// Contacts with the given ids, ordered by `created_at` then id.
  fn find_by_ids(
    &mut self,
    ids: &BTreeSet<ContactId>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// Contacts whose `linked_id` is `id`.
  fn find_by_linked_id(
    &mut self,
    id: ContactId,
  ) -> Result<Vec<Contact>, Self::Error>;

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>, Self::Error>;

  /// Persist `input`, assigning the id and timestamps.
  fn create(&mut self, input: NewContact) -> Result<Contact, Self::Error>;

  /// Overwrite the linkage fields of contact `id`.
  fn update(&mut self, id: ContactId, update: LinkUpdate) -> Result<(), Self::Error>;
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Abstraction over a reconciling contact backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Reconcile `identifiers` against the stored contacts and return the
  /// consolidated view of their identity group. Atomic: on error nothing is
  /// written.
  fn identify(
    &self,
    identifiers: Identifiers,
  ) -> impl Future<Output = Result<ConsolidatedIdentity, Self::Error>> + Send + '_;

  /// Retrieve a live contact by id. Returns `None` if absent or deleted.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// All live contacts, oldest first.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}
