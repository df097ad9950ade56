//! [`SqliteUnit`] — the row-level [`ContactStore`] over one open connection
//! or transaction.

use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tether_core::{
  contact::{Contact, ContactId, LinkUpdate, NewContact},
  store::ContactStore,
};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_precedence},
};

/// Borrows a connection for the duration of one unit of work. Pass a
/// `&rusqlite::Transaction` to make the work atomic.
pub struct SqliteUnit<'c> {
  conn: &'c rusqlite::Connection,
}

impl<'c> SqliteUnit<'c> {
  pub fn new(conn: &'c rusqlite::Connection) -> Self { Self { conn } }

  fn query(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let mut stmt = self.conn.prepare(sql)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }

  /// Every live contact, oldest first.
  pub fn all(&self) -> Result<Vec<Contact>> {
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE deleted_at IS NULL
         ORDER BY created_at, id"
      ),
      [],
    )
  }

  /// Insert a fully-specified row, keeping its id and timestamps.
  pub fn insert(&self, contact: &Contact) -> Result<()> {
    self.conn.execute(
      "INSERT INTO contacts (
         id, email, phone_number, link_precedence, linked_id,
         created_at, updated_at, deleted_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        contact.id.0,
        contact.email,
        contact.phone_number,
        encode_precedence(contact.link_precedence),
        contact.linked_id.map(|id| id.0),
        encode_dt(contact.created_at),
        encode_dt(contact.updated_at),
        contact.deleted_at.map(encode_dt),
      ],
    )?;
    Ok(())
  }
}

/// Current time at the precision the `created_at` column keeps.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

impl ContactStore for SqliteUnit<'_> {
  type Error = Error;

  fn find_by_exact_match(
    &mut self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // `col = NULL` is never true, so an absent argument matches nothing.
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE deleted_at IS NULL
           AND (email = ?1 OR phone_number = ?2)
         ORDER BY created_at, id"
      ),
      rusqlite::params![email, phone_number],
    )
  }

  fn find_by_ids(&mut self, ids: &BTreeSet<ContactId>) -> Result<Vec<Contact>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE deleted_at IS NULL
           AND id IN ({placeholders})
         ORDER BY created_at, id"
      ),
      rusqlite::params_from_iter(ids.iter().map(|id| id.0)),
    )
  }

  fn find_by_linked_id(&mut self, id: ContactId) -> Result<Vec<Contact>> {
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE deleted_at IS NULL
           AND linked_id = ?1
         ORDER BY created_at, id"
      ),
      rusqlite::params![id.0],
    )
  }

  fn find_by_id(&mut self, id: ContactId) -> Result<Option<Contact>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE deleted_at IS NULL AND id = ?1"
        ),
        rusqlite::params![id.0],
        RawContact::from_row,
      )
      .optional()?;

    raw.map(RawContact::into_contact).transpose()
  }

  fn create(&mut self, input: NewContact) -> Result<Contact> {
    let at = now();
    self.conn.execute(
      "INSERT INTO contacts (
         email, phone_number, link_precedence, linked_id, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        input.email,
        input.phone_number,
        encode_precedence(input.link_precedence),
        input.linked_id.map(|id| id.0),
        encode_dt(at),
      ],
    )?;

    Ok(Contact {
      id:              ContactId(self.conn.last_insert_rowid()),
      email:           input.email,
      phone_number:    input.phone_number,
      link_precedence: input.link_precedence,
      linked_id:       input.linked_id,
      created_at:      at,
      updated_at:      at,
      deleted_at:      None,
    })
  }

  fn update(&mut self, id: ContactId, update: LinkUpdate) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE contacts
       SET link_precedence = ?1, linked_id = ?2, updated_at = ?3
       WHERE id = ?4 AND deleted_at IS NULL",
      rusqlite::params![
        encode_precedence(update.link_precedence),
        update.linked_id.map(|id| id.0),
        encode_dt(now()),
        id.0,
      ],
    )?;

    if changed == 0 {
      return Err(Error::ContactNotFound(id));
    }
    Ok(())
  }
}
