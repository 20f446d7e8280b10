// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flat `KEY=VALUE` env files.
//!
//! ```text
//! load(path) --> EnvDocument --> set(k, v)... --> save(path)
//!   missing file => empty doc       |              temp file + rename
//!   bad lines    => skipped         v
//!                          in place / appended
//! ```
//!
//! Values are kept verbatim: quotes are content, not syntax.

mod io;
pub mod patch;

#[cfg(test)]
mod tests;

use tracing::debug;

pub use io::{load, save};

/// Effect of [`EnvDocument::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Key was new and has been appended.
    Inserted,
    /// Key existed with another value, replaced in place.
    Updated,
    /// Key already held this value.
    Unchanged,
}

/// Ordered key/value view of an env file.
///
/// Keys are unique and keep the position they were first seen at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDocument {
    entries: Vec<(String, String)>,
    skipped_lines: usize,
}

impl EnvDocument {
    /// Creates an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            skipped_lines: 0,
        }
    }

    /// Parses env file text.
    ///
    /// Each line is split at its first `=`. Blank lines, lines without `=`,
    /// lines with an empty key and `#` lines are skipped. A repeated key keeps
    /// its first position and takes the last value.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut doc = Self::new();

        for (index, raw) in content.lines().enumerate() {
            // `lines()` keeps a lone `\r` ending the last line.
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            let Some((key, value)) = line.split_once('=') else {
                if !line.trim().is_empty() {
                    debug!(line = index + 1, "skipping line without '='");
                }
                doc.skipped_lines += 1;
                continue;
            };

            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                debug!(line = index + 1, "skipping line without a usable key");
                doc.skipped_lines += 1;
                continue;
            }

            doc.set(key, value);
        }

        doc
    }

    /// Sets `key` to `value`.
    ///
    /// An existing key is updated in place, a new key is appended at the end.
    /// No other entry is touched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> SetOutcome {
        let key = key.into();
        let value = value.into();

        if let Some((_, current)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            if *current == value {
                return SetOutcome::Unchanged;
            }
            *current = value;
            SetOutcome::Updated
        } else {
            self.entries.push((key, value));
            SetOutcome::Inserted
        }
    }

    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of input lines that were not `KEY=VALUE` pairs.
    ///
    /// These lines are not written back by [`save`].
    #[must_use]
    pub const fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Serializes the document as `KEY=VALUE\n` lines in order.
    #[must_use]
    pub fn render(&self) -> String {
        let capacity = self
            .entries
            .iter()
            .map(|(k, v)| k.len() + v.len() + 2)
            .sum();

        let mut out = String::with_capacity(capacity);
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (key, value) in iter {
            doc.set(key, value);
        }
        doc
    }
}
