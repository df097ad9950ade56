//! [`SqliteStore`] — the SQLite implementation of [`IdentityStore`].

use std::path::Path;

use rusqlite::TransactionBehavior;
use tether_core::{
  contact::{Contact, ContactId},
  identity::{ConsolidatedIdentity, Identifiers},
  resolve,
  store::{ContactStore as _, IdentityStore},
};

use crate::{Result, schema::SCHEMA, unit::SqliteUnit};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tether contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// run one at a time on the connection's worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-specified contact, keeping its id and timestamps.
  ///
  /// Intended for importing rows from another system; no reconciliation is
  /// performed until the next [`IdentityStore::identify`] touches them.
  pub async fn insert_contact(&self, contact: Contact) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(SqliteUnit::new(conn).insert(&contact)))
      .await??;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = crate::Error;

  async fn identify(&self, identifiers: Identifiers) -> Result<ConsolidatedIdentity> {
    // IMMEDIATE takes the write lock before the seed lookup.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = resolve::identify(&mut SqliteUnit::new(&tx), &identifiers);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    Ok(outcome?)
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self
      .conn
      .call(move |conn| Ok(SqliteUnit::new(conn).find_by_id(id)))
      .await?
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    self
      .conn
      .call(|conn| Ok(SqliteUnit::new(conn).all()))
      .await?
  }
}
