//! Contact records — the nodes of an identity group.
//!
//! A contact carries at most one email and one phone number. Contacts that
//! share either value (or point at each other through `linked_id`) belong to
//! the same identity group, which has exactly one primary member.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned contact id. Monotonically increasing, never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical member of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

impl LinkPrecedence {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Primary => "primary",
      Self::Secondary => "secondary",
    }
  }
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  /// Set only on secondaries; names the group's primary.
  pub linked_id:       Option<ContactId>,
  /// Server-assigned; the sole "oldest wins" key.
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Soft-delete marker. Stores never return contacts with this set.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// Ordering key for primary selection: earliest `created_at`, then lowest
  /// id.
  pub fn age_key(&self) -> (DateTime<Utc>, ContactId) {
    (self.created_at, self.id)
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::create`]. The store assigns `id`
/// and the timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A contact that starts a new identity group.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A contact attached to an existing group's primary.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary),
    }
  }
}

/// The only mutation the resolver performs on an existing contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkUpdate {
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl LinkUpdate {
  pub fn demote_to(primary: ContactId) -> Self {
    Self {
      link_precedence: LinkPrecedence::Secondary,
      linked_id:       Some(primary),
    }
  }

  pub fn promote() -> Self {
    Self {
      link_precedence: LinkPrecedence::Primary,
      linked_id:       None,
    }
  }

  /// Apply to `contact` in place, refreshing `updated_at`.
  pub fn apply(self, contact: &mut Contact, now: DateTime<Utc>) {
    contact.link_precedence = self.link_precedence;
    contact.linked_id = self.linked_id;
    contact.updated_at = now;
  }
}
