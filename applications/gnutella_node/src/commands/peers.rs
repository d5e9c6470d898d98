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

use anyhow::Error;
use async_trait::async_trait;
use clap::Parser;
use gnutella_comms::PeerAddress;

use super::{print_indexed, CommandContext, HandleCommand};

/// Become neighbors with a peer
#[derive(Debug, Parser)]
pub struct HelloArgs {
    /// host:port of the peer
    address: PeerAddress,
}

#[async_trait]
impl HandleCommand<HelloArgs> for CommandContext {
    async fn handle_command(&mut self, args: HelloArgs) -> Result<(), Error> {
        self.node().say_hello(&args.address).await?;
        println!("🤝 {} is a neighbor", args.address);
        Ok(())
    }
}

impl CommandContext {
    pub async fn list_neighbors(&self) -> Result<(), Error> {
        let neighbors = self.node().neighbors().await;
        print_indexed(&neighbors, "No neighbors");
        Ok(())
    }

    pub fn whoami(&self) {
        let node = self.node();
        println!("Address:     {}", node.address());
        println!("Peer id:     {}", node.peer_id());
        println!("Consistency: {}", node.consistency_mode());
        println!("Directory:   {}", node.config().file_directory.display());
    }
}
