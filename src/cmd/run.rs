// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Main command: open the tunnel, patch the env file, keep the tunnel up.
//!
//! ```text
//! --url given?  yes --> url
//!               no  --> TunnelCommand::open() --> Tunnel { url }
//! println!(url)
//! load(env.path) --> EnvPatch::apply --> save (or print with --dry)
//! Tunnel::wait_closed(ctrl-c token)
//! ```

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::RunArgs;
use crate::config::{Config, EnvConfig};
use crate::env_file::{self, EnvDocument, patch::EnvPatch};
use crate::error::Result;
use crate::tunnel::{Closed, TunnelCommand};

/// Main handler.
///
/// # Errors
///
/// Returns an error if the tunnel cannot be opened, the URL is not an http(s)
/// URL, or the env file cannot be read or written.
pub async fn run_tunnel_command(args: &RunArgs, config: &Config) -> Result<()> {
    if let Some(url) = &args.url {
        announce(url);
        let doc = patch_env_file(url, &config.env, args.dry)?;
        if args.dry {
            print!("{}", doc.render());
        }
        return Ok(());
    }

    info!(port = config.tunnel.port, "opening a tunnel");
    let tunnel = TunnelCommand::from(&config.tunnel).open().await?;
    announce(tunnel.url());

    let doc = patch_env_file(tunnel.url(), &config.env, args.dry)?;
    if args.dry {
        print!("{}", doc.render());
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, closing tunnel...");
            ctrl_c_token.cancel();
        }
    });

    match tunnel.wait_closed(token).await? {
        Closed::Exited(code) => info!(code = ?code, "tunnel client exited"),
        Closed::Cancelled => info!("tunnel stopped"),
    }
    Ok(())
}

fn announce(url: &str) {
    println!("{url}");
}

/// Writes the keys derived from `url` into the configured env file.
///
/// Returns the patched document. With `dry_run` the file is left untouched.
///
/// # Errors
///
/// Returns an error if `url` is not an http(s) URL or the env file cannot be
/// read or written.
pub fn patch_env_file(url: &str, env: &EnvConfig, dry_run: bool) -> Result<EnvDocument> {
    let patch = EnvPatch::for_url(url, &env.patch_options())?;

    let mut doc = env_file::load(&env.path)?;
    patch.apply(&mut doc);

    if dry_run {
        info!(path = %env.path.display(), "dry run, env file not written");
    } else {
        env_file::save(&doc, &env.path)
            .with_context(|| format!("failed to update {}", env.path.display()))?;
        info!(path = %env.path.display(), "env file updated");
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::patch_env_file;
    use crate::config::EnvConfig;

    fn env_config(dir: &TempDir) -> EnvConfig {
        EnvConfig {
            path: dir.path().join(".env"),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn test_patch_env_file_writes_server_url() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = env_config(&dir);
        std::fs::write(&env.path, "FOO=bar\nBAZ=qux").unwrap();

        patch_env_file("https://x.example", &env, false).unwrap();

        assert_eq!(
            std::fs::read_to_string(&env.path).unwrap(),
            "FOO=bar\nBAZ=qux\nSERVER_URL=https://x.example/\n"
        );
    }

    #[test]
    fn test_patch_env_file_dry_run_leaves_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = env_config(&dir);
        std::fs::write(&env.path, "SERVER_URL=old\n").unwrap();

        let doc = patch_env_file("https://y.example", &env, true).unwrap();

        assert_eq!(doc.render(), "SERVER_URL=https://y.example/\n");
        assert_eq!(
            std::fs::read_to_string(&env.path).unwrap(),
            "SERVER_URL=old\n"
        );
    }

    #[test]
    fn test_patch_env_file_rejects_bad_url_before_touching_file() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = env_config(&dir);

        assert!(patch_env_file("not a url", &env, false).is_err());
        assert!(!env.path.exists());
    }

    #[test]
    fn test_patch_env_file_missing_dir_fails() {
        let env = EnvConfig {
            path: PathBuf::from("/definitely/not/here/.env"),
            ..EnvConfig::default()
        };
        let err = patch_env_file("https://z.example", &env, false).unwrap_err();
        assert!(format!("{err:#}").contains("failed to update"));
    }
}
