// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Spotting the public URL in tunnel client output.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("url pattern is valid"));

/// Returns the first http(s) URL in `line`.
///
/// Trailing sentence punctuation is not part of the URL.
#[must_use]
pub fn extract_url(line: &str) -> Option<&str> {
    let url = URL_PATTERN
        .find(line)?
        .as_str()
        .trim_end_matches(['.', ',', ';', ')']);

    let (_, rest) = url.split_once("://")?;
    (!rest.is_empty()).then_some(url)
}
