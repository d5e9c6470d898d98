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

//! A peer of the overlay.
//!
//! [PeerNodeBuilder] wires a [NodeContext] (the shared tables) to a transport, the inbound pipeline and the
//! consistency task. The resulting [PeerNode] is the operator surface: searching, handshakes, downloads, local file
//! updates and replica refresh.

mod builder;
pub use builder::PeerNodeBuilder;

mod context;
pub use context::NodeContext;

mod error;
pub use error::PeerNodeError;

mod handler;
pub use handler::PeerRequestHandler;

use std::sync::Arc;

use log::*;

use crate::{
    config::{ConsistencyMode, PeerConfig},
    consistency::{self, RefreshOutcome},
    event::{PeerEvent, PeerEventReceiver},
    file_location::FileLocation,
    message_id::MessageId,
    net_address::PeerAddress,
    query,
    rpc::MemoryNetwork,
    shutdown::Shutdown,
};

const LOG_TARGET: &str = "gnutella::node";

pub struct PeerNode {
    context: Arc<NodeContext>,
    shutdown: Shutdown,
    memory_network: Option<MemoryNetwork>,
}

impl PeerNode {
    pub(crate) fn new(context: Arc<NodeContext>, shutdown: Shutdown, memory_network: Option<MemoryNetwork>) -> Self {
        Self {
            context,
            shutdown,
            memory_network,
        }
    }

    pub fn address(&self) -> &PeerAddress {
        self.context.address()
    }

    pub fn peer_id(&self) -> i64 {
        self.context.peer_id()
    }

    pub fn config(&self) -> &PeerConfig {
        self.context.config()
    }

    pub fn consistency_mode(&self) -> ConsistencyMode {
        self.context.consistency().mode()
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }

    pub fn subscribe_events(&self) -> PeerEventReceiver {
        self.context.subscribe_events()
    }

    /// Floods a query for `file_name`. Hits are collected in [PeerNode::search_results].
    pub async fn search(&self, file_name: &str) -> MessageId {
        query::search(&self.context, file_name).await
    }

    /// Performs the hello handshake with `address`. On success both peers hold each other as neighbors.
    pub async fn say_hello(&self, address: &PeerAddress) -> Result<(), PeerNodeError> {
        if address == self.address() {
            return Err(PeerNodeError::SelfConnect);
        }
        let client = self.context.connector.connect(address).await?;
        if !client.hello(self.address().clone()).await? {
            return Err(PeerNodeError::HelloRejected(address.clone()));
        }
        if self.context.neighbors.add(address.clone(), client).await {
            info!(target: LOG_TARGET, "[{}] {} is now a neighbor", self.address(), address);
            self.context.publish_event(PeerEvent::NeighborAdded(address.clone()));
        }
        Ok(())
    }

    pub async fn neighbors(&self) -> Vec<PeerAddress> {
        self.context.neighbors.addresses().await
    }

    pub async fn local_files(&self) -> Vec<FileLocation> {
        self.context.local_files.snapshot().await
    }

    pub async fn remote_files(&self) -> Vec<FileLocation> {
        self.context.remote_files.snapshot().await
    }

    pub async fn search_results(&self) -> Vec<FileLocation> {
        self.context.search_results.snapshot().await
    }

    pub async fn clear_search_results(&self) {
        self.context.search_results.clear().await;
    }

    /// Registers an update of the local file `file_name`: its version is bumped and the consistency strategy is told
    /// about it.
    pub async fn touch(&self, file_name: &str) -> Result<FileLocation, PeerNodeError> {
        let updated = self
            .context
            .local_files
            .update_by_name(file_name, |location| location.touch())
            .await
            .ok_or_else(|| PeerNodeError::FileNotFound(file_name.to_string()))?;
        info!(target: LOG_TARGET, "[{}] Local file updated: {}", self.address(), updated);
        self.context.publish_event(PeerEvent::LocalFileUpdated(updated.clone()));
        self.context
            .consistency()
            .on_local_update(&self.context, &updated)
            .await;
        Ok(updated)
    }

    /// Downloads the file described by `location` (usually a search result) into the shared directory
    pub async fn download(&self, location: &FileLocation) -> Result<FileLocation, PeerNodeError> {
        Ok(self.context.download(location).await?)
    }

    /// Replaces every invalid replica with a fresh copy from its owner
    pub async fn refresh_files(&self) -> Vec<RefreshOutcome> {
        consistency::refresh_files(&self.context).await
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Stops the RPC server, the inbound pipeline and the consistency task. In-flight calls are allowed to finish.
    pub async fn shutdown(&mut self) {
        if self.shutdown.is_triggered() {
            return;
        }
        info!(target: LOG_TARGET, "[{}] Shutting down", self.address());
        self.shutdown.trigger();
        if let Some(network) = &self.memory_network {
            network.unregister(self.context.address()).await;
        }
    }
}
