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

pub mod cli_loop;
mod files;
mod peers;
mod reader;
mod search;

use anyhow::Error;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use gnutella_comms::PeerNode;

#[derive(Debug, Parser)]
#[clap(no_binary_name = true)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Hello(peers::HelloArgs),
    /// List the neighbors of this peer
    Neighbors,
    /// Show this peer's address, id and consistency mode
    Whoami,
    Search(search::SearchArgs),
    /// List the hits of the last search
    Results,
    Download(search::DownloadArgs),
    /// List the files this peer owns
    #[clap(alias = "viewlocal")]
    Local,
    /// List the downloaded copies held by this peer
    #[clap(alias = "viewremote")]
    Remote,
    Update(files::UpdateArgs),
    /// Download a fresh copy of every invalid replica
    Refresh,
    /// Shut the peer down and exit
    #[clap(alias = "exit")]
    Quit,
}

#[async_trait]
pub trait HandleCommand<T> {
    async fn handle_command(&mut self, args: T) -> Result<(), Error>;
}

pub struct CommandContext {
    node: PeerNode,
}

impl CommandContext {
    pub fn new(node: PeerNode) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &PeerNode {
        &self.node
    }

    pub fn into_node(self) -> PeerNode {
        self.node
    }
}

#[async_trait]
impl HandleCommand<Command> for CommandContext {
    async fn handle_command(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Hello(args) => self.handle_command(args).await,
            Command::Neighbors => self.list_neighbors().await,
            Command::Whoami => {
                self.whoami();
                Ok(())
            },
            Command::Search(args) => self.handle_command(args).await,
            Command::Results => self.list_search_results().await,
            Command::Download(args) => self.handle_command(args).await,
            Command::Local => self.list_local_files().await,
            Command::Remote => self.list_remote_files().await,
            Command::Update(args) => self.handle_command(args).await,
            Command::Refresh => self.refresh_files().await,
            // Handled by the loop
            Command::Quit => Ok(()),
        }
    }
}

/// Prints `items` one per line prefixed with their index, or `empty` if there are none
fn print_indexed<T: std::fmt::Display>(items: &[T], empty: &str) {
    if items.is_empty() {
        println!("{}", empty);
        return;
    }
    for (i, item) in items.iter().enumerate() {
        println!("{:>3}: {}", i, item);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(line: &str) -> Result<Command, clap::Error> {
        Args::try_parse_from(line.split_whitespace()).map(|args| args.command)
    }

    #[test]
    fn parses_console_lines() {
        assert!(matches!(parse("hello 127.0.0.1:9000").unwrap(), Command::Hello(_)));
        assert!(matches!(parse("search notes.txt").unwrap(), Command::Search(_)));
        assert!(matches!(parse("download 2").unwrap(), Command::Download(_)));
        assert!(matches!(parse("viewlocal").unwrap(), Command::Local));
        assert!(matches!(parse("viewremote").unwrap(), Command::Remote));
        assert!(matches!(parse("update 0").unwrap(), Command::Update(_)));
        assert!(matches!(parse("exit").unwrap(), Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("hello").is_err());
        assert!(parse("hello nowhere").is_err());
        assert!(parse("download x").is_err());
        assert!(parse("update -1").is_err());
        assert!(parse("teleport").is_err());
    }
}
