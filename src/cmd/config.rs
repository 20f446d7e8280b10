// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Config-related commands for envtunnel.

use crate::config::Config;

/// Display loaded configuration files and the effective options.
pub fn run_print_config_command(config: &Config, config_files: &[String]) {
    if config_files.is_empty() {
        println!("# no configuration files loaded");
    } else {
        for line in config_files {
            println!("# {line}");
        }
    }
    for line in config.format_options() {
        println!("{line}");
    }
}
