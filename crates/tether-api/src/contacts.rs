//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contacts` | All live contacts, oldest first |
//! | `GET`  | `/contacts/:id` | 404 if absent or deleted |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use tether_core::{
  contact::{Contact, ContactId},
  store::IdentityStore,
};

use crate::error::ApiError;

/// `GET /contacts`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: IdentityStore,
{
  let contacts = store.list_contacts().await.map_err(ApiError::store)?;
  Ok(Json(contacts))
}

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<Contact>, ApiError>
where
  S: IdentityStore,
{
  let contact = store
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}
