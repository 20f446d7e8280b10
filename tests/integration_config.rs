// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Tests the Config module with realistic TOML configurations.

use std::path::PathBuf;

use envtunnel::config::Config;
use envtunnel::config::loader::ConfigLoader;

// =============================================================================
// Loading from TOML strings
// =============================================================================

#[test]
fn config_parse_empty() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.tunnel.port, 8000);
    assert_eq!(config.env.path, PathBuf::from("../.env"));
}

#[test]
fn config_parse_full() {
    let toml = r#"
[tunnel]
port = 5000
program = "/usr/local/bin/lt"
args = ["--port", "{port}", "--local-host", "127.0.0.1"]
subdomain = "mtest"
host = "https://localtunnel.me"
url_timeout_secs = 10

[env]
path = "/srv/app/.env"
server_url_key = "PUBLIC_URL"
nginx_host_key = "NGINX_HOST"
trailing_slash = false
"#;
    let config = Config::parse(toml).unwrap();

    assert_eq!(config.tunnel.port, 5000);
    assert_eq!(config.tunnel.program, "/usr/local/bin/lt");
    assert_eq!(config.tunnel.args.len(), 4);
    assert_eq!(config.tunnel.subdomain.as_deref(), Some("mtest"));
    assert_eq!(config.tunnel.host.as_deref(), Some("https://localtunnel.me"));
    assert_eq!(config.tunnel.url_timeout().as_secs(), 10);
    assert_eq!(config.env.path, PathBuf::from("/srv/app/.env"));
    assert_eq!(config.env.server_url_key, "PUBLIC_URL");
    assert_eq!(config.env.nginx_host_key.as_deref(), Some("NGINX_HOST"));
    assert!(!config.env.trailing_slash);
}

#[test]
fn config_parse_invalid_toml() {
    assert!(Config::parse("[tunnel\nport = ").is_err());
}

#[test]
fn config_parse_wrong_type() {
    assert!(Config::parse("[tunnel]\nport = \"eighty\"\n").is_err());
}

#[test]
fn config_parse_unknown_section() {
    assert!(Config::parse("[paths]\nprefix = \"/build\"\n").is_err());
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn config_file_then_override() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("envtunnel.toml");
    std::fs::write(&path, "[tunnel]\nport = 3000\nsubdomain = \"from-file\"\n").unwrap();

    let loader = ConfigLoader::new()
        .add_toml_file(&path)
        .set("tunnel.subdomain", "from-cli");
    assert_eq!(loader.loaded_files(), [("file".to_string(), path.clone())]);

    let config = loader.build().unwrap();
    assert_eq!(config.tunnel.port, 3000);
    assert_eq!(config.tunnel.subdomain.as_deref(), Some("from-cli"));
}

#[test]
fn config_format_loaded_files() {
    let loader = ConfigLoader::new()
        .add_toml_str("")
        .add_toml_file_optional("/definitely/not/here/envtunnel.toml");
    assert_eq!(loader.format_loaded_files(), ["1. [string] <string>"]);
}
