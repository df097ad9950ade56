//! Resolver input and output: validated identifiers in, consolidated view out.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  contact::{Contact, ContactId},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// An email and/or phone number to reconcile. At least one is always present.
///
/// Construct with [`Identifiers::new`]; empty strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
  email:        Option<String>,
  phone_number: Option<String>,
}

impl Identifiers {
  pub fn new(email: Option<String>, phone_number: Option<String>) -> Result<Self> {
    let email = email.filter(|e| !e.is_empty());
    let phone_number = phone_number.filter(|p| !p.is_empty());
    if email.is_none() && phone_number.is_none() {
      return Err(Error::InvalidRequest);
    }
    Ok(Self { email, phone_number })
  }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }

  /// True if this pair mentions an email or phone number that none of
  /// `known` carries.
  pub fn is_new_to(&self, known: &[Contact]) -> bool {
    let new_email = self
      .email()
      .is_some_and(|e| !known.iter().any(|c| c.email.as_deref() == Some(e)));
    let new_phone = self.phone_number().is_some_and(|p| {
      !known.iter().any(|c| c.phone_number.as_deref() == Some(p))
    });
    new_email || new_phone
  }

  pub fn into_parts(self) -> (Option<String>, Option<String>) {
    (self.email, self.phone_number)
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Everything known about one identity group.
///
/// The primary's own email and phone number, when it has them, are always
/// the first entries of their lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIdentity {
  /// Serialised under the key existing clients already parse.
  #[serde(rename = "primaryContatctId")]
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

impl ConsolidatedIdentity {
  /// View of a group that consists of `primary` alone.
  pub fn single(primary: &Contact) -> Self {
    Self {
      primary_contact_id:    primary.id,
      emails:                primary.email.iter().cloned().collect(),
      phone_numbers:         primary.phone_number.iter().cloned().collect(),
      secondary_contact_ids: Vec::new(),
    }
  }

  /// Assemble the view from `members`, which must be ordered oldest first.
  pub fn assemble(
    primary: &Contact,
    members: &[Contact],
    secondary_contact_ids: Vec<ContactId>,
  ) -> Self {
    let emails = lead_with(
      distinct(members.iter().filter_map(|c| c.email.as_deref())),
      primary.email.as_deref(),
    );
    let phone_numbers = lead_with(
      distinct(members.iter().filter_map(|c| c.phone_number.as_deref())),
      primary.phone_number.as_deref(),
    );

    Self {
      primary_contact_id: primary.id,
      emails,
      phone_numbers,
      secondary_contact_ids,
    }
  }
}

/// Distinct values in first-occurrence order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for v in values {
    if !out.iter().any(|seen| seen == v) {
      out.push(v.to_owned());
    }
  }
  out
}

/// Move `first` to index 0, keeping the relative order of everything else.
fn lead_with(mut values: Vec<String>, first: Option<&str>) -> Vec<String> {
  if let Some(first) = first
    && let Some(pos) = values.iter().position(|v| v == first)
  {
    let v = values.remove(pos);
    values.insert(0, v);
  }
  values
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::contact::LinkPrecedence;

  fn contact(id: i64, email: Option<&str>, phone: Option<&str>) -> Contact {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, id as u32).unwrap();
    Contact {
      id:              ContactId(id),
      email:           email.map(str::to_owned),
      phone_number:    phone.map(str::to_owned),
      link_precedence: LinkPrecedence::Secondary,
      linked_id:       None,
      created_at:      at,
      updated_at:      at,
      deleted_at:      None,
    }
  }

  #[test]
  fn empty_identifiers_are_rejected() {
    assert!(matches!(Identifiers::new(None, None), Err(Error::InvalidRequest)));
    assert!(matches!(
      Identifiers::new(Some(String::new()), Some(String::new())),
      Err(Error::InvalidRequest)
    ));
  }

  #[test]
  fn empty_string_counts_as_absent() {
    let ids = Identifiers::new(Some(String::new()), Some("555".into())).unwrap();
    assert_eq!(ids.email(), None);
    assert_eq!(ids.phone_number(), Some("555"));
  }

  #[test]
  fn new_information_is_checked_per_field() {
    let known = [contact(1, Some("a@x.com"), None), contact(2, None, Some("555"))];

    let both_known = Identifiers::new(Some("a@x.com".into()), Some("555".into())).unwrap();
    assert!(!both_known.is_new_to(&known));

    let new_phone = Identifiers::new(Some("a@x.com".into()), Some("777".into())).unwrap();
    assert!(new_phone.is_new_to(&known));

    let email_only = Identifiers::new(Some("a@x.com".into()), None).unwrap();
    assert!(!email_only.is_new_to(&known));
  }

  #[test]
  fn assemble_puts_primary_values_first() {
    let members = [
      contact(1, Some("old@x.com"), Some("111")),
      contact(2, Some("primary@x.com"), None),
      contact(3, Some("old@x.com"), Some("222")),
      contact(4, None, Some("111")),
    ];
    let primary = &members[1];

    let view = ConsolidatedIdentity::assemble(
      primary,
      &members,
      vec![ContactId(1), ContactId(3), ContactId(4)],
    );

    assert_eq!(view.primary_contact_id, ContactId(2));
    assert_eq!(view.emails, ["primary@x.com", "old@x.com"]);
    assert_eq!(view.phone_numbers, ["111", "222"]);
    assert_eq!(view.secondary_contact_ids, [ContactId(1), ContactId(3), ContactId(4)]);
  }

  #[test]
  fn wire_format_keeps_client_key_names() {
    let view = ConsolidatedIdentity::single(&contact(7, Some("a@x.com"), None));
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "primaryContatctId": 7,
        "emails": ["a@x.com"],
        "phoneNumbers": [],
        "secondaryContactIds": [],
      })
    );
  }
}
