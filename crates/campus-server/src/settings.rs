//! Server configuration.
//!
//! Values come from an optional TOML file, then `CAMPUS_*` environment
//! variables. Every field has a default, so an empty config starts a server
//! on `127.0.0.1:8080` backed by `campus.db`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use campus_api::ApiConfig;
use chrono::TimeDelta;
use serde::Deserialize;

/// Longest accepted session lifetime: one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub session_ttl_hours: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8080,
      store_path:        PathBuf::from("campus.db"),
      session_ttl_hours: 168,
    }
  }
}

impl ServerConfig {
  /// Layer `path` (if it exists) and the environment into a config.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CAMPUS"))
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
      anyhow::bail!(
        "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
        self.session_ttl_hours
      );
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig { session_ttl: TimeDelta::hours(self.session_ttl_hours) }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/campus-test.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.session_ttl_hours, 168);
    assert_eq!(cfg.api_config().session_ttl, TimeDelta::hours(168));
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir().join(format!("campus-cfg-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "port = 9000\nsession_ttl_hours = 2").unwrap();
    drop(file);

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.address(), "127.0.0.1:9000");
    assert_eq!(cfg.api_config().session_ttl, TimeDelta::hours(2));
  }

  #[test]
  fn out_of_range_ttl_is_rejected() {
    for hours in [0, -1, MAX_SESSION_TTL_HOURS + 1, i64::MAX] {
      let cfg = ServerConfig { session_ttl_hours: hours, ..ServerConfig::default() };
      assert!(cfg.validate().is_err(), "{hours}");
    }
    let cfg = ServerConfig { session_ttl_hours: MAX_SESSION_TTL_HOURS, ..ServerConfig::default() };
    assert!(cfg.validate().is_ok());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/campus.db")), PathBuf::from(home).join("campus.db"));
    assert_eq!(expand_tilde(Path::new("/var/campus.db")), PathBuf::from("/var/campus.db"));
  }
}
