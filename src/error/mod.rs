// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//! EnvFileError  Read, Write
//! TunnelError   ExecutableNotFound, SpawnFailed, ExitedEarly, UrlTimeout, InvalidUrl, Io
//! ConfigError   InvalidValue, Load
//!        |
//!        v
//! anyhow::Error (with context) --> main
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

// --- Env File Errors ---

/// Errors raised while loading or saving an env file.
///
/// A missing file is not an error on load; it yields an empty document.
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// The file exists but could not be read (permissions, invalid UTF-8, ...).
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written (permissions, missing parent directory, ...).
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type using [`EnvFileError`].
pub type EnvFileResult<T> = std::result::Result<T, EnvFileError>;

// --- Tunnel Errors ---

/// Tunnel client errors.
#[derive(Debug, Error)]
pub enum TunnelError {
    /// Tunnel client executable not found.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn the tunnel client.
    #[error("failed to spawn tunnel client '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The client exited before announcing a public URL.
    #[error("tunnel client '{command}' exited with code {code} before announcing a url")]
    ExitedEarly { command: String, code: i32 },

    /// No URL was announced in time.
    #[error("tunnel client '{command}' announced no url within {timeout_secs} seconds")]
    UrlTimeout { command: String, timeout_secs: u64 },

    /// The public URL is not an http(s) URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// I/O error while talking to the client.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Configuration sources could not be merged or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
