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

//! # Gnutella node
//!
//! A console peer for the Gnutella-style overlay in [gnutella_comms]. It shares the files of one directory, finds
//! files on other peers by flooding queries and keeps downloaded copies consistent in push or pull mode.

pub mod cli;
mod commands;
pub mod config;
pub mod logging;

use std::process;

use gnutella_comms::{PeerAddress, PeerConfig, PeerNode, PeerNodeBuilder};
use log::*;

use crate::{
    cli::Cli,
    commands::{cli_loop::CliLoop, CommandContext},
};

const LOG_TARGET: &str = "gnutella::node::app";

/// Starts the peer, says hello to the seed neighbors and runs the console until the operator quits
pub async fn run_node(config: PeerConfig, cli: Cli) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.file_directory).await?;
    let node = PeerNodeBuilder::new(config).build().await?;
    println!(
        "Peer {} started in {} mode, sharing {} file(s) from {}",
        node.address(),
        node.consistency_mode(),
        node.local_files().await.len(),
        node.config().file_directory.display()
    );

    let connected = seed_neighbors(&node, &cli.neighbors).await;
    if !cli.neighbors.is_empty() {
        println!("Connected to {}/{} seed neighbor(s)", connected, cli.neighbors.len());
    }

    let main_loop = CliLoop::new(CommandContext::new(node), cli.non_interactive);
    if cli.non_interactive {
        println!("Peer running in non-interactive mode (pid = {})", process::id());
    }
    let mut node = main_loop.cli_loop().await.into_node();
    node.shutdown().await;
    println!("Goodbye!");
    Ok(())
}

/// Performs the hello handshake with each seed. Unreachable seeds are reported and skipped. Returns the number of
/// seeds that became neighbors.
pub async fn seed_neighbors(node: &PeerNode, seeds: &[PeerAddress]) -> usize {
    let mut connected = 0;
    for seed in seeds {
        match node.say_hello(seed).await {
            Ok(()) => connected += 1,
            Err(err) => {
                warn!(target: LOG_TARGET, "Could not say hello to seed {}: {}", seed, err);
                println!("☠️ Seed {} is unreachable: {}", seed, err);
            },
        }
    }
    connected
}

#[cfg(test)]
mod test {
    use gnutella_comms::rpc::MemoryNetwork;

    use super::*;

    async fn spawn(network: &MemoryNetwork, dir: &tempfile::TempDir) -> PeerNode {
        let mut config = PeerConfig::default_local_test();
        config.file_directory = dir.path().to_path_buf();
        PeerNodeBuilder::new(config)
            .with_memory_network(network.clone())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unreachable_seeds_are_skipped() {
        let network = MemoryNetwork::new();
        let (dir_a, dir_b, dir_c) = (
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
            tempfile::tempdir().unwrap(),
        );
        let a = spawn(&network, &dir_a).await;
        let b = spawn(&network, &dir_b).await;
        let c = spawn(&network, &dir_c).await;

        let seeds = vec![
            b.address().clone(),
            PeerAddress::new("127.0.0.1", 1),
            c.address().clone(),
        ];
        assert_eq!(seed_neighbors(&a, &seeds).await, 2);
        assert_eq!(a.neighbors().await.len(), 2);
        assert_eq!(b.neighbors().await, vec![a.address().clone()]);
    }
}
