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

/// Flood a query for a file. Hits are listed with `results`.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    file_name: String,
}

/// Download one of the search results into the shared directory
#[derive(Debug, Parser)]
pub struct DownloadArgs {
    /// Index in the `results` listing
    index: usize,
}

#[async_trait]
impl HandleCommand<SearchArgs> for CommandContext {
    async fn handle_command(&mut self, args: SearchArgs) -> Result<(), Error> {
        self.node().clear_search_results().await;
        let message_id = self.node().search(&args.file_name).await;
        println!("🔍 Searching for '{}' ({})", args.file_name, message_id);
        Ok(())
    }
}

#[async_trait]
impl HandleCommand<DownloadArgs> for CommandContext {
    async fn handle_command(&mut self, args: DownloadArgs) -> Result<(), Error> {
        let location = self
            .node()
            .search_results()
            .await
            .into_iter()
            .nth(args.index)
            .ok_or_else(|| anyhow!("No search result at index {}", args.index))?;
        println!("⬇️  Downloading {}", location);
        let downloaded = self.node().download(&location).await?;
        println!("Downloaded {}", downloaded);
        Ok(())
    }
}

impl CommandContext {
    pub async fn list_search_results(&self) -> Result<(), Error> {
        let results = self.node().search_results().await;
        print_indexed(&results, "No search results");
        Ok(())
    }
}
