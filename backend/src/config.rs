//! Runtime configuration for the backend binary, read from environment
//! variables with sensible local defaults.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "SLEEP_TRACKER_DATA_DIR";
pub const BIND_VAR: &str = "SLEEP_TRACKER_BIND";
pub const ALLOWED_ORIGIN_VAR: &str = "SLEEP_TRACKER_ALLOWED_ORIGIN";

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";
const DATA_DIRECTORY_NAME: &str = "Sleep Tracker";

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Default data directory; a redirect file inside it may point elsewhere
    pub data_directory: PathBuf,
    pub bind_address: SocketAddr,
    /// Origin allowed by the CORS layer
    pub allowed_origin: String,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_directory = match non_empty(lookup(DATA_DIR_VAR)) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_directory()?,
        };

        let bind_raw = non_empty(lookup(BIND_VAR)).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_address = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("{} is not a valid socket address: {}", BIND_VAR, bind_raw))?;

        let allowed_origin =
            non_empty(lookup(ALLOWED_ORIGIN_VAR)).unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());

        Ok(Self {
            data_directory,
            bind_address,
            allowed_origin,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn default_data_directory() -> Result<PathBuf> {
    let documents = dirs::document_dir()
        .or_else(dirs::home_dir)
        .context("Could not determine a documents or home directory")?;
    Ok(documents.join(DATA_DIRECTORY_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = BackendConfig::from_lookup(lookup_from(&[
            (DATA_DIR_VAR, "/tmp/sleep"),
            (BIND_VAR, "0.0.0.0:8000"),
            (ALLOWED_ORIGIN_VAR, "http://example.test"),
        ]))
        .unwrap();

        assert_eq!(config.data_directory, PathBuf::from("/tmp/sleep"));
        assert_eq!(config.bind_address, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.allowed_origin, "http://example.test");
    }

    #[test]
    fn test_defaults_for_bind_and_origin() {
        let config = BackendConfig::from_lookup(lookup_from(&[(DATA_DIR_VAR, "/tmp/sleep"), (BIND_VAR, "  ")]))
            .unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
    }

    #[test]
    fn test_invalid_bind_address() {
        let result = BackendConfig::from_lookup(lookup_from(&[(DATA_DIR_VAR, "/tmp/sleep"), (BIND_VAR, "nope")]));
        assert!(result.is_err());
    }
}
