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

//! # Gnutella Node
//!
//! ## Running a peer
//!
//! `cargo run -p gnutella_node -- -P 9000 -D ./shared -N 127.0.0.1:9001,127.0.0.1:9002 --mode pull`
//!
//! ## Commands
//!
//! `hello <host:port>` - Becomes neighbors with a peer
//! `neighbors` - Lists the neighbors of this peer
//! `search <name>` - Floods a query for a file
//! `results` - Lists the hits of the last search
//! `download <i>` - Downloads search result `i`
//! `local` / `viewlocal` - Lists the files this peer owns
//! `remote` / `viewremote` - Lists downloaded replicas
//! `update <i>` - Bumps the version of local file `i`
//! `refresh` - Re-downloads every invalid replica
//! `quit` - Exits the peer
use std::process;

use clap::Parser;
use gnutella_node::{cli::Cli, config::load_configuration, logging::initialize_logging, run_node};
use log::*;

const LOG_TARGET: &str = "gnutella::node::app";

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{:?}", err);
        error!(target: LOG_TARGET, "Exiting with error: {:?}", err);
        process::exit(1);
    }
}

fn main_inner() -> anyhow::Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli.log_config, include_str!("../log4rs_sample.yml"))?;
    info!(
        target: LOG_TARGET,
        "Starting Gnutella node version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let config = load_configuration(&cli)?;
    debug!(target: LOG_TARGET, "Using peer configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run_node(config, cli))
}
