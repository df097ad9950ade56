//! Handler for `POST /identify`.
//!
//! Body: `{"email": "...", "phoneNumber": "..."}`, either field optional but
//! not both. `phoneNumber` may also be sent as a JSON number.
//!
//! Response: `{"contact": ConsolidatedIdentity}`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Deserializer, Serialize};
use tether_core::{
  identity::{ConsolidatedIdentity, Identifiers},
  store::IdentityStore,
};

use crate::{error::ApiError, extract::JsonBody};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default, deserialize_with = "string_or_number")]
  pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedIdentity,
}

/// Accept `"123456"`, `123456` or `null`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
    Raw::Text(s) => s,
    Raw::Number(n) => n.to_string(),
  }))
}

/// `POST /identify`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<IdentifyBody>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: IdentityStore,
{
  let identifiers = Identifiers::new(body.email, body.phone_number)?;
  let contact = store
    .identify(identifiers)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(IdentifyResponse { contact }))
}
