//! HTTP front end for Tether.
//!
//! Mounts the [`tether_api`] router at both `/` and `/api`, adds a service
//! banner at `GET /`, and wraps everything in request tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tether_core::store::IdentityStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// `store_path` value that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Runtime server configuration, deserialised from `config.toml` and
/// `TETHER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `TETHER_*` environment
  /// variables, on top of built-in defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with_env(path, config::Environment::with_prefix("TETHER"))
  }

  fn load_with_env(
    path: &Path,
    env: config::Environment,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3000_i64)?
      .set_default("store_path", "tether.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn is_in_memory(&self) -> bool { self.store_path == Path::new(IN_MEMORY) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`] for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: IdentityStore + 'static,
{
  let api = tether_api::api_router(store);

  Router::new()
    .route("/", get(banner))
    .merge(api.clone())
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

/// `GET /`
async fn banner() -> Json<Value> {
  Json(json!({
    "message": "Tether identity reconciliation API",
    "endpoints": {
      "identify": "POST /identify",
      "contacts": "GET /contacts",
      "health":   "GET /health",
    },
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use tether_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store))
  }

  async fn oneshot_json(
    app:    Router,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── Routing ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn banner_lists_endpoints() {
    let (status, body) = oneshot_json(app().await, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["identify"], "POST /identify");
  }

  #[tokio::test]
  async fn health_is_served_at_both_prefixes() {
    let app = app().await;
    for uri in ["/health", "/api/health"] {
      let (status, body) = oneshot_json(app.clone(), "GET", uri, None).await;
      assert_eq!(status, StatusCode::OK, "{uri}");
      assert_eq!(body, json!({ "status": "ok" }));
    }
  }

  // ── Identify ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn identify_merges_groups_across_prefixes() {
    let app = app().await;

    let (_, first) = oneshot_json(
      app.clone(),
      "POST",
      "/identify",
      Some(json!({ "email": "george@hillvalley.edu", "phoneNumber": "919191" })),
    )
    .await;
    let (_, second) = oneshot_json(
      app.clone(),
      "POST",
      "/api/identify",
      Some(json!({ "email": "biffsucks@hillvalley.edu", "phoneNumber": "717171" })),
    )
    .await;
    assert_ne!(
      first["contact"]["primaryContatctId"],
      second["contact"]["primaryContatctId"]
    );

    let (status, merged) = oneshot_json(
      app.clone(),
      "POST",
      "/identify",
      Some(json!({ "email": "george@hillvalley.edu", "phoneNumber": "717171" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      merged,
      json!({
        "contact": {
          "primaryContatctId": first["contact"]["primaryContatctId"],
          "emails": ["george@hillvalley.edu", "biffsucks@hillvalley.edu"],
          "phoneNumbers": ["919191", "717171"],
          "secondaryContactIds": [second["contact"]["primaryContatctId"]],
        }
      })
    );

    let (_, contacts) = oneshot_json(app, "GET", "/api/contacts", None).await;
    assert_eq!(contacts.as_array().map(Vec::len), Some(2));
    assert_eq!(contacts[1]["linkPrecedence"], "secondary");
    assert_eq!(contacts[1]["linkedId"], first["contact"]["primaryContatctId"]);
  }

  #[tokio::test]
  async fn empty_identify_is_rejected() {
    let (status, body) =
      oneshot_json(app().await, "POST", "/api/identify", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  // ── Configuration ────────────────────────────────────────────────────────────

  /// `TETHER_*` source fed from `vars` instead of the process environment.
  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let map = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    config::Environment::with_prefix("TETHER").source(Some(map))
  }

  fn write_config(name: &str, contents: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir()
      .join(format!("tether-cfg-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
  }

  #[test]
  fn missing_config_file_falls_back_to_defaults() {
    let cfg =
      ServerConfig::load_with_env(Path::new("/nonexistent/tether.toml"), env(&[]))
        .unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:3000");
    assert_eq!(cfg.store_path, PathBuf::from("tether.db"));
    assert!(!cfg.is_in_memory());
  }

  #[test]
  fn config_file_overrides_defaults() {
    let (dir, path) = write_config(
      "file",
      "host = \"127.0.0.1\"\nport = 8080\nstore_path = \":memory:\"\n",
    );

    let cfg = ServerConfig::load_with_env(&path, env(&[])).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(cfg.is_in_memory());

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn environment_overrides_config_file() {
    let (dir, path) = write_config("env", "port = 8080\n");

    let cfg = ServerConfig::load_with_env(
      &path,
      env(&[("TETHER_PORT", "9090"), ("TETHER_STORE_PATH", ":memory:")]),
    )
    .unwrap();
    assert_eq!(cfg.port, 9090);
    assert!(cfg.is_in_memory());

    let _ = std::fs::remove_dir_all(&dir);
  }
}
