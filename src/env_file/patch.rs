// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Keys derived from a public tunnel URL.
//!
//! ```text
//! https://abc.loca.lt
//!   SERVER_URL = https://abc.loca.lt/   (trailing_slash)
//!   NGINX_HOST = abc.loca.lt            (when nginx_host_key is set)
//! ```

use bon::Builder;
use tracing::info;

use super::{EnvDocument, SetOutcome};
use crate::error::TunnelError;

/// Which keys a URL is written to, and how.
#[derive(Debug, Clone, Builder)]
pub struct PatchOptions {
    #[builder(into, default = "SERVER_URL".to_string())]
    server_url_key: String,
    #[builder(into)]
    nginx_host_key: Option<String>,
    #[builder(default = true)]
    trailing_slash: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Ordered key/value pairs to overlay onto a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPatch {
    entries: Vec<(String, String)>,
}

impl EnvPatch {
    /// Plans the keys for a public URL.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::InvalidUrl`] if `url` is not an `http://` or
    /// `https://` URL with a host.
    pub fn for_url(url: &str, options: &PatchOptions) -> Result<Self, TunnelError> {
        let host = strip_scheme(url)
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|host| !host.is_empty())
            .ok_or_else(|| TunnelError::InvalidUrl(url.to_string()))?;

        let server_url = if options.trailing_slash && !url.ends_with('/') {
            format!("{url}/")
        } else {
            url.to_string()
        };

        let mut patch = Self::default();
        patch.push(options.server_url_key.clone(), server_url);
        if let Some(key) = &options.nginx_host_key {
            patch.push(key.clone(), host.to_string());
        }
        Ok(patch)
    }

    /// Adds a pair; a later pair for the same key wins when applied.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets every pair on `doc`, in order.
    pub fn apply(&self, doc: &mut EnvDocument) {
        for (key, value) in &self.entries {
            match doc.set(key.as_str(), value.as_str()) {
                SetOutcome::Inserted => info!(key = %key, value = %value, "added"),
                SetOutcome::Updated => info!(key = %key, value = %value, "updated"),
                SetOutcome::Unchanged => info!(key = %key, "already up to date"),
            }
        }
    }
}

fn strip_scheme(url: &str) -> Option<&str> {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
}
