//! Async HTTP client wrapping the tether JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tether_core::{
  contact::{Contact, ContactId},
  identity::ConsolidatedIdentity,
};

/// Connection settings for the tether API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the tether JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyBody<'a> {
  email:        Option<&'a str>,
  phone_number: Option<&'a str>,
}

#[derive(Deserialize)]
struct IdentifyEnvelope {
  contact: ConsolidatedIdentity,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// `POST /api/identify`
  pub async fn identify(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<ConsolidatedIdentity> {
    tracing::debug!(?email, ?phone_number, "identify");
    let resp = self
      .client
      .post(self.url("/identify"))
      .json(&IdentifyBody { email, phone_number })
      .send()
      .await
      .context("POST /identify failed")?;

    let envelope: IdentifyEnvelope = decode(resp, "POST /identify").await?;
    Ok(envelope.contact)
  }

  /// `GET /api/contacts`
  pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
    let resp = self
      .client
      .get(self.url("/contacts"))
      .send()
      .await
      .context("GET /contacts failed")?;
    decode(resp, "GET /contacts").await
  }

  /// `GET /api/contacts/:id`
  pub async fn get_contact(&self, id: ContactId) -> Result<Contact> {
    let path = format!("/contacts/{id}");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    decode(resp, &format!("GET {path}")).await
  }

  /// `GET /api/health`
  pub async fn health(&self) -> Result<Value> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .context("GET /health failed")?;
    decode(resp, "GET /health").await
  }
}

/// Deserialise a success body, or turn the server's `{"error": ...}` body into
/// an error naming `what`.
async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned))
      .unwrap_or_default();
    return Err(anyhow!("{what} → {status} {message}"));
  }
  resp
    .json()
    .await
    .with_context(|| format!("deserialising {what} response"))
}
