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

use anyhow::{anyhow, Error};
use async_trait::async_trait;
use clap::Parser;

use super::{print_indexed, CommandContext, HandleCommand};

/// Register an update of a local file, bumping its version
#[derive(Debug, Parser)]
pub struct UpdateArgs {
    /// Index in the `local` listing
    index: usize,
}

#[async_trait]
impl HandleCommand<UpdateArgs> for CommandContext {
    async fn handle_command(&mut self, args: UpdateArgs) -> Result<(), Error> {
        let location = self
            .node()
            .local_files()
            .await
            .into_iter()
            .nth(args.index)
            .ok_or_else(|| anyhow!("No local file at index {}", args.index))?;
        let updated = self.node().touch(location.name()).await?;
        println!("Updated {}", updated);
        Ok(())
    }
}

impl CommandContext {
    pub async fn list_local_files(&self) -> Result<(), Error> {
        let files = self.node().local_files().await;
        print_indexed(&files, "No local files");
        Ok(())
    }

    pub async fn list_remote_files(&self) -> Result<(), Error> {
        let files = self.node().remote_files().await;
        print_indexed(&files, "No remote files");
        Ok(())
    }

    pub async fn refresh_files(&self) -> Result<(), Error> {
        let outcomes = self.node().refresh_files().await;
        if outcomes.is_empty() {
            println!("All replicas are valid");
        }
        for outcome in outcomes {
            match outcome.result {
                Ok(location) => println!("🔄 Refreshed {}", location),
                Err(err) => println!("☠️ Could not refresh '{}': {}", outcome.file_name, err),
            }
        }
        Ok(())
    }
}
