//! In-process contact backend.
//!
//! [`MemoryStore`] is a plain table implementing [`ContactStore`].
//! [`InMemoryStore`] is the shareable [`IdentityStore`] handle around it: each
//! `identify` runs the resolver against a private copy of the table and swaps
//! the copy in only when the resolver succeeds.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use crate::{
  Error, Result,
  contact::{Contact, ContactId, LinkUpdate, NewContact},
  identity::{ConsolidatedIdentity, Identifiers},
  resolve,
  store::{ContactStore, IdentityStore},
};

// ─── Table ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  contacts: BTreeMap<ContactId, Contact>,
  last_id:  i64,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Insert a fully-specified row, replacing any row with the same id.
  /// Later [`ContactStore::create`] calls are assigned ids above it.
  pub fn insert(&mut self, contact: Contact) {
    self.last_id = self.last_id.max(contact.id.0);
    self.contacts.insert(contact.id, contact);
  }

  /// Number of live contacts.
  pub fn len(&self) -> usize { self.live().count() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn live(&self) -> impl Iterator<Item = &Contact> {
    self.contacts.values().filter(|c| c.deleted_at.is_none())
  }

  fn collect_sorted<'a>(rows: impl Iterator<Item = &'a Contact>) -> Vec<Contact> {
    let mut out: Vec<Contact> = rows.cloned().collect();
    out.sort_by_key(Contact::age_key);
    out
  }
}

impl ContactStore for MemoryStore {
  type Error = Error;

  fn find_by_exact_match(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    Ok(Self::collect_sorted(self.live().filter(|c| {
      (email.is_some() && c.email.as_deref() == email)
        || (phone_number.is_some() && c.phone_number.as_deref() == phone_number)
    })))
  }

  fn find_by_ids(&mut self, ids: &BTreeSet<ContactId>) -> Result<Vec<Contact>> {
    Ok(Self::collect_sorted(self.live().filter(|c| ids.contains(&c.id))))
  }

  fn find_by_linked_id(&mut self, id: ContactId) -> Result<Vec<Contact>> {
    Ok(Self::collect_sorted(
      self.live().filter(|c| c.linked_id == Some(id)),
    ))
  }

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>> {
    Ok(
      self
        .contacts
        .get(&id)
        .filter(|c| c.deleted_at.is_none())
        .cloned(),
    )
  }

  fn create(&mut self, input: NewContact) -> Result<Contact> {
    self.last_id += 1;
    let now = Utc::now();
    let contact = Contact {
      id:              ContactId(self.last_id),
      email:           input.email,
      phone_number:    input.phone_number,
      link_precedence: input.link_precedence,
      linked_id:       input.linked_id,
      created_at:      now,
      updated_at:      now,
      deleted_at:      None,
    };
    self.contacts.insert(contact.id, contact.clone());
    Ok(contact)
  }

  fn update(&mut self, id: ContactId, update: LinkUpdate) -> Result<()> {
    let contact = self
      .contacts
      .get_mut(&id)
      .filter(|c| c.deleted_at.is_none())
      .ok_or(Error::ContactNotFound(id))?;
    update.apply(contact, Utc::now());
    Ok(())
  }
}

// ─── Shared handle ───────────────────────────────────────────────────────────

/// A cloneable, process-scoped [`IdentityStore`] with no persistence.
///
/// Calls are serialised on one mutex, so the whole of each `identify` is
/// atomic with respect to every other call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
  inner: Arc<Mutex<MemoryStore>>,
}

impl InMemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn from_table(table: MemoryStore) -> Self {
    Self { inner: Arc::new(Mutex::new(table)) }
  }

  fn lock(&self) -> MutexGuard<'_, MemoryStore> {
    // The table is only ever replaced wholesale.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Run `work` against a copy of the table, keeping the copy only if it
  /// returns `Ok`.
  fn transact<T>(&self, work: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
    let mut table = self.lock();
    let mut copy = table.clone();
    let out = work(&mut copy)?;
    *table = copy;
    Ok(out)
  }
}

impl IdentityStore for InMemoryStore {
  type Error = Error;

  async fn identify(&self, identifiers: Identifiers) -> Result<ConsolidatedIdentity> {
    self.transact(|table| resolve::identify(table, &identifiers))
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self.lock().find_by_id(id)
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    Ok(MemoryStore::collect_sorted(self.lock().live()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::contact::LinkPrecedence;

  fn ids(email: Option<&str>, phone: Option<&str>) -> Identifiers {
    Identifiers::new(email.map(str::to_owned), phone.map(str::to_owned)).unwrap()
  }

  #[test]
  fn create_assigns_increasing_ids() {
    let mut table = MemoryStore::new();
    let a = table.create(NewContact::primary(Some("a@x.com".into()), None)).unwrap();
    let b = table
      .create(NewContact::secondary(None, Some("555".into()), a.id))
      .unwrap();
    assert!(b.id > a.id);
    assert_eq!(b.linked_id, Some(a.id));
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn absent_arguments_match_nothing() {
    let mut table = MemoryStore::new();
    table.create(NewContact::primary(None, Some("555".into()))).unwrap();
    assert!(table.find_by_exact_match(None, None).unwrap().is_empty());
    assert!(table.find_by_exact_match(Some("a@x.com"), None).unwrap().is_empty());
    assert_eq!(table.find_by_exact_match(None, Some("555")).unwrap().len(), 1);
  }

  #[test]
  fn update_rejects_unknown_ids() {
    let mut table = MemoryStore::new();
    let err = table
      .update(ContactId(42), LinkUpdate::demote_to(ContactId(1)))
      .unwrap_err();
    assert!(matches!(err, Error::ContactNotFound(ContactId(42))));
  }

  #[tokio::test]
  async fn shared_handle_commits_each_call() {
    let store = InMemoryStore::new();

    let first = store.identify(ids(Some("a@x.com"), None)).await.unwrap();
    let second = store
      .identify(ids(Some("a@x.com"), Some("555")))
      .await
      .unwrap();

    assert_eq!(first.primary_contact_id, second.primary_contact_id);
    assert_eq!(second.secondary_contact_ids.len(), 1);

    let all = store.list_contacts().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].link_precedence, LinkPrecedence::Primary);
    assert_eq!(all[1].linked_id, Some(all[0].id));

    let fetched = store.get_contact(all[1].id).await.unwrap();
    assert_eq!(fetched.as_ref(), Some(&all[1]));
  }

  #[tokio::test]
  async fn failed_work_leaves_the_table_unchanged() {
    let store = InMemoryStore::new();
    store.identify(ids(Some("a@x.com"), None)).await.unwrap();
    let before = store.list_contacts().await.unwrap();

    let err = store
      .transact(|table| {
        let view = resolve::identify(table, &ids(Some("a@x.com"), Some("555")))?;
        assert_eq!(table.len(), 2);
        table.update(ContactId(99), LinkUpdate::demote_to(view.primary_contact_id))
      })
      .unwrap_err();
    assert!(matches!(err, Error::ContactNotFound(ContactId(99))));

    assert_eq!(store.list_contacts().await.unwrap(), before);

    let view = store
      .identify(ids(Some("a@x.com"), Some("555")))
      .await
      .unwrap();
    assert_eq!(view.secondary_contact_ids, [ContactId(2)]);
  }
}
