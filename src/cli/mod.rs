// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for envtunnel using clap derive.
//!
//! # Usage
//!
//! ```text
//! envtunnel [options] [PORT] [ENV_FILE]
//!
//! PORT      local port handed to the tunnel client (default 8000)
//! ENV_FILE  env file to patch (default ../.env)
//! ```

pub mod global;


use crate::cli::global::GlobalOptions;
use crate::config::loader::ConfigLoader;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Name of the optional configuration file in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "envtunnel.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ENVTUNNEL";

/// Expose a local port and patch its public URL into an env file.
#[derive(Debug, Parser)]
#[command(
    name = "envtunnel",
    author,
    version,
    about = "Expose a local port and write its public URL into a .env file",
    long_about = "Starts a tunnel client (localtunnel's `lt` by default) for a local\n\
                  port, prints the public URL it announces, and sets SERVER_URL in\n\
                  an env file to that URL. Other keys in the file are kept in\n\
                  place. The tunnel stays open until the client exits or Ctrl-C.",
    after_help = "CONFIGURATION:\n\n\
                  Settings are read from `envtunnel.toml` in the current directory,\n\
                  then from --config, then from ENVTUNNEL_<SECTION>__<KEY>\n\
                  environment variables (e.g. ENVTUNNEL_TUNNEL__SUBDOMAIN=mtest).\n\
                  Command-line arguments override all of them."
)]
pub struct Cli {
    /// Logging and configuration-source options
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Local port to expose.
    #[arg(value_name = "PORT")]
    pub port: Option<u16>,

    /// Env file to patch.
    #[arg(value_name = "ENV_FILE")]
    pub env_path: Option<PathBuf>,

    /// Tunnel and patch options
    #[command(flatten)]
    pub run: RunArgs,
}

/// Options for opening the tunnel and patching the file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Use this public URL instead of starting a tunnel client.
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Subdomain to request from the tunnel server.
    #[arg(short = 's', long = "subdomain", value_name = "NAME")]
    pub subdomain: Option<String>,

    /// Tunnel server to use instead of the client's default.
    #[arg(long = "host", value_name = "URL")]
    pub host: Option<String>,

    /// Tunnel client executable.
    #[arg(long = "program", value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Key that receives the public URL.
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    pub key: Option<String>,

    /// Also write the bare host to NGINX_HOST.
    #[arg(long = "nginx-host")]
    pub nginx_host: bool,

    /// Write the URL without a trailing slash.
    #[arg(long = "no-trailing-slash")]
    pub no_trailing_slash: bool,

    /// Print the patched file instead of writing it.
    #[arg(long)]
    pub dry: bool,

    /// Print the effective configuration and exit.
    #[arg(long = "print-config")]
    pub print_config: bool,
}

impl Cli {
    /// Builds the configuration loader for these arguments.
    ///
    /// ```text
    /// envtunnel.toml < --config < ENVTUNNEL_* < arguments
    /// ```
    #[must_use]
    pub fn config_loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if !self.global.no_default_config {
            loader = loader.add_toml_file_optional(DEFAULT_CONFIG_FILE);
        }
        if let Some(path) = &self.global.config {
            loader = loader.add_toml_file(path);
        }
        loader = loader.with_env_prefix(ENV_PREFIX);

        for (key, value) in self.config_overrides() {
            loader = loader.set(key, value);
        }
        loader
    }

    /// Converts command-line arguments to configuration overrides.
    #[must_use]
    pub fn config_overrides(&self) -> Vec<(&'static str, config::Value)> {
        let mut overrides: Vec<(&'static str, config::Value)> = Vec::new();

        if let Some(port) = self.port {
            overrides.push(("tunnel.port", i64::from(port).into()));
        }
        if let Some(path) = &self.env_path {
            overrides.push(("env.path", path.display().to_string().into()));
        }
        if let Some(subdomain) = &self.run.subdomain {
            overrides.push(("tunnel.subdomain", subdomain.clone().into()));
        }
        if let Some(host) = &self.run.host {
            overrides.push(("tunnel.host", host.clone().into()));
        }
        if let Some(program) = &self.run.program {
            overrides.push(("tunnel.program", program.clone().into()));
        }
        if let Some(key) = &self.run.key {
            overrides.push(("env.server_url_key", key.clone().into()));
        }
        if self.run.nginx_host {
            overrides.push(("env.nginx_host_key", "NGINX_HOST".into()));
        }
        if self.run.no_trailing_slash {
            overrides.push(("env.trailing_slash", false.into()));
        }

        overrides
    }
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
