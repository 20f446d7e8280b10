// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for envtunnel.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. envtunnel.toml (cwd, optional)
//! 3. --config FILE
//! 4. ENVTUNNEL_* env vars
//! 5. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! ENVTUNNEL_TUNNEL__PORT=9000           → tunnel.port = 9000
//! ENVTUNNEL_TUNNEL__SUBDOMAIN=mtest     → tunnel.subdomain = "mtest"
//! ENVTUNNEL_ENV__PATH=/srv/app/.env     → env.path = "/srv/app/.env"
//! ```
//!
//! # Example
//!
//! ```toml
//! [tunnel]
//! port = 8000
//! program = "lt"
//! args = ["--port", "{port}"]
//! subdomain = "mtest"
//!
//! [env]
//! path = "../.env"
//! nginx_host_key = "NGINX_HOST"
//! ```

pub mod loader;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::env_file::patch::PatchOptions;
use crate::error::{ConfigError, Result};

use loader::ConfigLoader;

/// Placeholder replaced by the local port in `tunnel.args`.
pub const PORT_PLACEHOLDER: &str = "{port}";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tunnel client options.
    pub tunnel: TunnelConfig,
    /// Env file options.
    pub env: EnvConfig,
}

/// How the tunnel client is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TunnelConfig {
    /// Local port to expose.
    pub port: u16,
    /// Tunnel client executable.
    pub program: String,
    /// Client arguments; `{port}` is replaced by `port`.
    pub args: Vec<String>,
    /// Requested subdomain, passed as `--subdomain`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Tunnel server, passed as `--host`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// How long to wait for the client to announce its URL.
    pub url_timeout_secs: u64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            program: "lt".to_string(),
            args: vec!["--port".to_string(), PORT_PLACEHOLDER.to_string()],
            subdomain: None,
            host: None,
            url_timeout_secs: 30,
        }
    }
}

impl TunnelConfig {
    /// URL wait timeout as a [`Duration`].
    #[must_use]
    pub const fn url_timeout(&self) -> Duration {
        Duration::from_secs(self.url_timeout_secs)
    }
}

/// Which file is patched and which keys are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    /// Env file to patch.
    pub path: PathBuf,
    /// Key receiving the public URL.
    pub server_url_key: String,
    /// Key receiving the bare host, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nginx_host_key: Option<String>,
    /// Append `/` to the public URL.
    pub trailing_slash: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("../.env"),
            server_url_key: "SERVER_URL".to_string(),
            nginx_host_key: None,
            trailing_slash: true,
        }
    }
}

impl EnvConfig {
    /// Patch options for [`crate::env_file::patch::EnvPatch::for_url`].
    #[must_use]
    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions::builder()
            .server_url_key(self.server_url_key.clone())
            .maybe_nginx_host_key(self.nginx_host_key.clone())
            .trailing_slash(self.trailing_slash)
            .build()
    }
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use envtunnel::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("envtunnel.toml")
    ///     .with_env_prefix("ENVTUNNEL")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML, does not match the
    /// `Config` structure, or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Rejects values the tool cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty program, an empty
    /// server URL key, empty optional keys or a zero timeout.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |section: &str, key: &str, message: &str| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.tunnel.program.trim().is_empty() {
            return Err(invalid("tunnel", "program", "must not be empty"));
        }
        if self.tunnel.url_timeout_secs == 0 {
            return Err(invalid(
                "tunnel",
                "url_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.env.server_url_key.trim().is_empty() {
            return Err(invalid("env", "server_url_key", "must not be empty"));
        }
        if self
            .env
            .nginx_host_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            return Err(invalid("env", "nginx_host_key", "must not be empty when set"));
        }
        if self.env.path.as_os_str().is_empty() {
            return Err(invalid("env", "path", "must not be empty"));
        }
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();

        options.insert("tunnel.port", self.tunnel.port.to_string());
        options.insert("tunnel.program", self.tunnel.program.clone());
        options.insert("tunnel.args", self.tunnel.args.join(" "));
        if let Some(subdomain) = &self.tunnel.subdomain {
            options.insert("tunnel.subdomain", subdomain.clone());
        }
        if let Some(host) = &self.tunnel.host {
            options.insert("tunnel.host", host.clone());
        }
        options.insert(
            "tunnel.url_timeout_secs",
            self.tunnel.url_timeout_secs.to_string(),
        );
        options.insert("env.path", self.env.path.display().to_string());
        options.insert("env.server_url_key", self.env.server_url_key.clone());
        if let Some(key) = &self.env.nginx_host_key {
            options.insert("env.nginx_host_key", key.clone());
        }
        options.insert("env.trailing_slash", self.env.trailing_slash.to_string());

        let max_key_len = options.keys().map(|k| k.len()).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}
