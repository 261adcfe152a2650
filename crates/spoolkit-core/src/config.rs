// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoolError};

/// Port CUPS listens on when a server address names none.
pub const DEFAULT_CUPS_PORT: u16 = 631;

/// Connection and submission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// IPP URI of the CUPS scheduler.
    pub cups_server: String,
    /// Requesting user name sent with every IPP request.
    pub user_name: Option<String>,
    /// Accept self-signed certificates on `ipps://` servers.
    pub ignore_tls_errors: bool,
    /// Largest single write issued while streaming job data.
    pub write_chunk_size: usize,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            cups_server: format!("ipp://localhost:{DEFAULT_CUPS_PORT}"),
            user_name: None,
            ignore_tls_errors: false,
            write_chunk_size: 64 * 1024,
        }
    }
}

impl SpoolConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `CUPS_SERVER` and `CUPS_USER` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay using an arbitrary lookup; `with_env_overrides` passes the
    /// process environment.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(server) = lookup("CUPS_SERVER").filter(|s| !s.trim().is_empty()) {
            self.cups_server = server_uri(server.trim());
        }
        if let Some(user) = lookup("CUPS_USER").filter(|s| !s.trim().is_empty()) {
            self.user_name = Some(user.trim().to_string());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.write_chunk_size == 0 {
            return Err(SpoolError::Config("write_chunk_size must be positive".into()));
        }
        let valid_scheme = ["ipp://", "ipps://", "http://", "https://"]
            .iter()
            .any(|scheme| self.cups_server.starts_with(scheme));
        if !valid_scheme || self.cups_server.contains(char::is_whitespace) {
            return Err(SpoolError::Config(format!(
                "cups_server '{}' is not an ipp, ipps, http or https URI",
                self.cups_server
            )));
        }
        Ok(())
    }

    /// User name for IPP requests: configured, then login name, then
    /// `anonymous`.
    pub fn effective_user(&self) -> String {
        self.user_name
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Turn a libcups-style server value into an IPP URI.
///
/// `CUPS_SERVER` may hold a full URI, `host`, `host:port` or a domain socket
/// path. Domain sockets are reached through the local TCP listener.
fn server_uri(value: &str) -> String {
    if value.contains("://") {
        return value.to_string();
    }
    if value.starts_with('/') {
        return format!("ipp://localhost:{DEFAULT_CUPS_PORT}");
    }
    let has_port = value
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.ends_with(':') && port.parse::<u16>().is_ok());
    if has_port {
        format!("ipp://{value}")
    } else {
        format!("ipp://{value}:{DEFAULT_CUPS_PORT}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = SpoolConfig::default();
        assert_eq!(config.cups_server, "ipp://localhost:631");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "user_name": "ops", "write_chunk_size": 4096 }}"#).unwrap();

        let config = SpoolConfig::load(file.path()).unwrap();
        assert_eq!(config.user_name.as_deref(), Some("ops"));
        assert_eq!(config.write_chunk_size, 4096);
        assert_eq!(config.cups_server, "ipp://localhost:631");
    }

    #[test]
    fn load_rejects_zero_chunk_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "write_chunk_size": 0 }}"#).unwrap();
        assert!(matches!(SpoolConfig::load(file.path()), Err(SpoolError::Config(_))));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SpoolConfig::load(file.path()),
            Err(SpoolError::Serialization(_))
        ));
    }

    #[test]
    fn unknown_scheme_rejected() {
        let config = SpoolConfig {
            cups_server: "lpd://printhost".into(),
            ..SpoolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_bare_host_gets_default_port() {
        let config = SpoolConfig::default().apply_env(env(&[("CUPS_SERVER", "printhost")]));
        assert_eq!(config.cups_server, "ipp://printhost:631");
    }

    #[test]
    fn env_host_with_port_kept() {
        let config = SpoolConfig::default().apply_env(env(&[("CUPS_SERVER", "printhost:8631")]));
        assert_eq!(config.cups_server, "ipp://printhost:8631");
    }

    #[test]
    fn env_socket_path_maps_to_localhost() {
        let config = SpoolConfig::default()
            .apply_env(env(&[("CUPS_SERVER", "/run/cups/cups.sock"), ("CUPS_USER", "lp")]));
        assert_eq!(config.cups_server, "ipp://localhost:631");
        assert_eq!(config.user_name.as_deref(), Some("lp"));
    }

    #[test]
    fn env_full_uri_passes_through() {
        let config =
            SpoolConfig::default().apply_env(env(&[("CUPS_SERVER", "ipps://cups.example:443")]));
        assert_eq!(config.cups_server, "ipps://cups.example:443");
    }

    #[test]
    fn configured_user_wins() {
        let config = SpoolConfig {
            user_name: Some("alice".into()),
            ..SpoolConfig::default()
        };
        assert_eq!(config.effective_user(), "alice");
    }
}
