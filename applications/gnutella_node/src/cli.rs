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

use std::path::PathBuf;

use clap::Parser;
use gnutella_comms::{ConsistencyMode, PeerAddress};

const DEFAULT_LOG_CONFIG: &str = "config/log4rs.yml";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// Host this peer binds to and advertises to its neighbors
    #[clap(short = 'L', long)]
    pub local_address: Option<String>,
    /// Port of the peer's RPC server. 0 picks a random port.
    #[clap(short = 'P', long)]
    pub local_port: Option<u16>,
    /// Directory of shared files. Downloads are stored here too.
    #[clap(short = 'D', long)]
    pub dir: Option<PathBuf>,
    /// Peers to say hello to at startup, as a comma separated list of host:port
    #[clap(short = 'N', long, value_delimiter = ',')]
    pub neighbors: Vec<PeerAddress>,
    /// Replica consistency mode: push or pull
    #[clap(short, long)]
    pub mode: Option<ConsistencyMode>,
    /// A TOML configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// The log4rs configuration file. A sample is written there if it does not exist.
    #[clap(long, default_value = DEFAULT_LOG_CONFIG)]
    pub log_config: PathBuf,
    /// Run without the console, until Ctrl-C
    #[clap(short, long, alias = "non-interactive-mode")]
    pub non_interactive: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_all_options() {
        let cli = Cli::try_parse_from([
            "gnutella_node",
            "-L",
            "10.0.0.1",
            "-P",
            "9000",
            "-D",
            "shared",
            "-N",
            "10.0.0.2:9000,10.0.0.3:9001",
            "--mode",
            "pull",
            "--non-interactive",
        ])
        .unwrap();
        assert_eq!(cli.local_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.local_port, Some(9000));
        assert_eq!(cli.dir, Some(PathBuf::from("shared")));
        assert_eq!(cli.neighbors, vec![
            PeerAddress::new("10.0.0.2", 9000),
            PeerAddress::new("10.0.0.3", 9001)
        ]);
        assert_eq!(cli.mode, Some(ConsistencyMode::Pull));
        assert!(cli.non_interactive);
        assert_eq!(cli.log_config, PathBuf::from(DEFAULT_LOG_CONFIG));
        assert!(cli.config.is_none());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["gnutella_node"]).unwrap();
        assert!(cli.neighbors.is_empty());
        assert!(cli.mode.is_none());
        assert!(!cli.non_interactive);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Cli::try_parse_from(["gnutella_node", "-N", "no-port"]).is_err());
        assert!(Cli::try_parse_from(["gnutella_node", "--mode", "both"]).is_err());
        assert!(Cli::try_parse_from(["gnutella_node", "-P", "70000"]).is_err());
    }
}
