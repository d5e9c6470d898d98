// Copyright 2024, The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::path::Path;

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use gnutella_comms::PeerConfig;
use log::*;

use crate::cli::Cli;

const LOG_TARGET: &str = "gnutella::node::config";

/// Prefix of environment variables overriding configuration values, e.g. `GNUTELLA_QUERY_TTL=4` or
/// `GNUTELLA_PULL__INTERVAL=10` for nested values.
pub const ENV_PREFIX: &str = "GNUTELLA";

/// Loads the peer configuration. Later sources override earlier ones: built-in defaults, the TOML file given with
/// `--config`, `GNUTELLA_*` environment variables, then the command line.
pub fn load_configuration(cli: &Cli) -> anyhow::Result<PeerConfig> {
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);
    load_with_environment(cli, environment)
}

fn load_with_environment(cli: &Cli, environment: Environment) -> anyhow::Result<PeerConfig> {
    let mut builder = Config::builder().add_source(Config::try_from(&PeerConfig::default())?);
    if let Some(path) = cli.config.as_deref() {
        debug!(target: LOG_TARGET, "Loading configuration file from {}", path.display());
        builder = builder.add_source(config_file(path));
    }
    builder = builder.add_source(environment);

    if let Some(host) = cli.local_address.as_ref() {
        builder = builder.set_override("listen_address.host", host.as_str())?;
    }
    if let Some(port) = cli.local_port {
        builder = builder.set_override("listen_address.port", i64::from(port))?;
    }
    if let Some(dir) = cli.dir.as_ref() {
        builder = builder.set_override("file_directory", dir.to_string_lossy().to_string())?;
    }
    if let Some(mode) = cli.mode {
        builder = builder.set_override("consistency_mode", mode.to_string())?;
    }

    let config = builder
        .build()?
        .try_deserialize::<PeerConfig>()
        .context("Invalid peer configuration")?;
    config.validate()?;
    Ok(config)
}

fn config_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml).required(true)
}
