//! `tether` — command-line client for the Tether identity API.
//!
//! # Usage
//!
//! ```text
//! tether identify --email doc@hillvalley.edu --phone 88
//! tether --url http://localhost:3000 contacts
//! tether --config ~/.config/tether/config.toml contact 7
//! ```

mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::{Deserialize, Serialize};
use tether_core::contact::ContactId;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tether", about = "Client for the Tether identity API")]
struct Args {
  /// Path to a TOML config file (`url = "..."`).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the tether server (default: http://localhost:3000).
  #[arg(long, env = "TETHER_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile an email and/or phone number and print the identity group.
  Identify {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
  },
  /// List every stored contact.
  Contacts,
  /// Show one contact by id.
  Contact { id: i64 },
  /// Check that the server is up.
  Health,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// CLI flag overrides config file, which overrides the default.
fn base_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(ApiConfig { base_url: base_url(args.url, &file_cfg) })?;

  match args.command {
    Command::Identify { email, phone } => {
      if email.is_none() && phone.is_none() {
        anyhow::bail!("pass --email, --phone, or both");
      }
      print_json(
        &client
          .identify(email.as_deref(), phone.as_deref())
          .await?,
      )
    }
    Command::Contacts => print_json(&client.list_contacts().await?),
    Command::Contact { id } => print_json(&client.get_contact(ContactId(id)).await?),
    Command::Health => print_json(&client.health().await?),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!(
    "{}",
    serde_json::to_string_pretty(value).context("serialising output")?
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flag_beats_file_beats_default() {
    let file = ConfigFile { url: "http://file:1".into() };
    let empty = ConfigFile::default();

    assert_eq!(base_url(Some("http://flag:2".into()), &file), "http://flag:2");
    assert_eq!(base_url(None, &file), "http://file:1");
    assert_eq!(base_url(None, &empty), DEFAULT_URL);
  }

  #[test]
  fn identify_arguments_parse() {
    let args = Args::parse_from(["tether", "identify", "--email", "a@x.com"]);
    match args.command {
      Command::Identify { email, phone } => {
        assert_eq!(email.as_deref(), Some("a@x.com"));
        assert_eq!(phone, None);
      }
      other => panic!("unexpected command {other:?}"),
    }
  }
}
