// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! External tunnel client supervision.
//!
//! ```text
//! TunnelCommand::open()
//!   which(program)
//!   spawn  program args... [--subdomain S] [--host H]
//!   scan stdout lines ──(first http(s) URL)──> Tunnel { url, child }
//!        |  EOF first      => ExitedEarly
//!        |  url_timeout    => UrlTimeout (child killed)
//!
//! Tunnel::wait_closed(token)
//!   child exits     => warn "tunnel closed"  => Closed::Exited
//!   token cancelled => kill child            => Closed::Cancelled
//! ```
//!
//! The relay itself lives entirely in the client; this module only reads
//! what the client prints.

mod url;


use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use bon::Builder;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{PORT_PLACEHOLDER, TunnelConfig};
use crate::error::TunnelError;

pub use url::extract_url;

/// How to start the tunnel client.
#[derive(Debug, Clone, Builder)]
pub struct TunnelCommand {
    #[builder(into)]
    program: String,
    #[builder(default)]
    args: Vec<String>,
    port: u16,
    #[builder(into)]
    subdomain: Option<String>,
    #[builder(into)]
    host: Option<String>,
    #[builder(default = Duration::from_secs(30))]
    url_timeout: Duration,
}

impl From<&TunnelConfig> for TunnelCommand {
    fn from(config: &TunnelConfig) -> Self {
        Self::builder()
            .program(config.program.clone())
            .args(config.args.clone())
            .port(config.port)
            .maybe_subdomain(config.subdomain.clone())
            .maybe_host(config.host.clone())
            .url_timeout(config.url_timeout())
            .build()
    }
}

impl TunnelCommand {
    /// Arguments passed to the client, with `{port}` substituted.
    #[must_use]
    pub fn resolved_args(&self) -> Vec<String> {
        let port = self.port.to_string();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(PORT_PLACEHOLDER, &port))
            .collect();

        if let Some(subdomain) = &self.subdomain {
            args.push("--subdomain".to_string());
            args.push(subdomain.clone());
        }
        if let Some(host) = &self.host {
            args.push("--host".to_string());
            args.push(host.clone());
        }
        args
    }

    /// Returns the full command line as a string (for logging).
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in self.resolved_args() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    fn resolve_program(&self) -> Result<PathBuf, TunnelError> {
        which::which(&self.program).map_err(|e| {
            debug!(program = %self.program, error = %e, "lookup failed");
            TunnelError::ExecutableNotFound {
                name: self.program.clone(),
            }
        })
    }

    /// Starts the client and waits for it to announce its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The program cannot be found or spawned.
    /// - The client exits before printing an http(s) URL.
    /// - No URL is printed within the timeout (the client is killed).
    pub async fn open(&self) -> Result<Tunnel, TunnelError> {
        let cmd_line = self.command_line();
        let program = self.resolve_program()?;

        debug!(cmd = %cmd_line, "exec");
        let mut child = Command::new(&program)
            .args(self.resolved_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TunnelError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;
        trace!(pid = ?child.id(), "spawned");

        let mut readers = Vec::with_capacity(2);
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(BufReader::new(stderr).lines(), "stderr"));
        }

        let Some(stdout) = child.stdout.take() else {
            return Err(TunnelError::Io(std::io::Error::other(
                "tunnel client stdout was not captured",
            )));
        };
        let mut lines = BufReader::new(stdout).lines();

        let deadline = Instant::now() + self.url_timeout;
        let url = match tokio::time::timeout_at(deadline, next_url(&mut lines)).await {
            Ok(Ok(Some(url))) => url,
            Ok(Ok(None)) => {
                // Closed stdout does not mean the client is gone.
                if let Ok(status) = tokio::time::timeout_at(deadline, child.wait()).await {
                    return Err(TunnelError::ExitedEarly {
                        command: cmd_line,
                        code: status?.code().unwrap_or(-1),
                    });
                }
                warn!(
                    timeout = ?self.url_timeout,
                    "client closed stdout without a url, stopping it"
                );
                child.kill().await.ok();
                return Err(TunnelError::UrlTimeout {
                    command: cmd_line,
                    timeout_secs: self.url_timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                child.kill().await.ok();
                return Err(TunnelError::Io(e));
            }
            Err(_) => {
                warn!(timeout = ?self.url_timeout, "no url announced, stopping tunnel client");
                child.kill().await.ok();
                return Err(TunnelError::UrlTimeout {
                    command: cmd_line,
                    timeout_secs: self.url_timeout.as_secs(),
                });
            }
        };

        info!(url = %url, "tunnel open");
        readers.push(forward_lines(lines, "stdout"));

        Ok(Tunnel {
            url,
            child,
            readers,
        })
    }
}

/// How a tunnel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closed {
    /// The client exited on its own, with this code if it had one.
    Exited(Option<i32>),
    /// Shutdown was requested and the client was killed.
    Cancelled,
}

/// A running tunnel client that announced its public URL.
#[derive(Debug)]
pub struct Tunnel {
    url: String,
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl Tunnel {
    /// Public URL announced by the client.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits until the client exits or `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on or killing the child process fails.
    pub async fn wait_closed(mut self, token: CancellationToken) -> Result<Closed, TunnelError> {
        let closed = tokio::select! {
            status = self.child.wait() => {
                let code = status?.code();
                warn!(code = ?code, "tunnel closed");
                Closed::Exited(code)
            }
            () = token.cancelled() => {
                info!("stopping tunnel client");
                self.child.kill().await?;
                Closed::Cancelled
            }
        };

        // Pipes may outlive the client when it leaves children behind.
        for reader in &self.readers {
            reader.abort();
        }
        Ok(closed)
    }
}

/// Reads lines until one contains a URL; `None` on end of output.
async fn next_url(
    lines: &mut Lines<BufReader<ChildStdout>>,
) -> std::io::Result<Option<String>> {
    while let Some(line) = lines.next_line().await? {
        trace!(stream = "stdout", line = %line, "output");
        if let Some(url) = extract_url(&line) {
            return Ok(Some(url.to_string()));
        }
    }
    Ok(None)
}

/// Forwards remaining client output to the debug log.
fn forward_lines<R>(mut lines: Lines<BufReader<R>>, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(stream, line = %line, "tunnel client"),
                Ok(None) => break,
                Err(e) => {
                    warn!(stream, error = %e, "error reading tunnel client output");
                    break;
                }
            }
        }
    })
}
