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

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use log::*;
use tokio::time;

use crate::{
    config::PeerConfig,
    consistency::ConsistencyStrategy,
    event::{PeerEvent, PeerEventReceiver, PeerEventSender},
    file_location::FileLocation,
    file_table::FileTable,
    inbound::{InboundHandler, InboundMessage},
    ledger::MessageLedger,
    message_id::{MessageId, MessageIdGenerator},
    neighbors::NeighborDirectory,
    net_address::PeerAddress,
    query,
    rpc::{Connector, PeerClient, RpcError},
    transfer::{self, TransferError},
};

const LOG_TARGET: &str = "gnutella::node::context";

/// State shared by the request handlers, the inbound pipeline, the consistency task and the operator API of a peer.
/// Every table carries its own lock.
pub struct NodeContext {
    pub(crate) config: PeerConfig,
    pub(crate) address: PeerAddress,
    pub(crate) peer_id: i64,
    pub(crate) id_generator: MessageIdGenerator,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) neighbors: NeighborDirectory,
    pub(crate) ledger: Arc<dyn MessageLedger>,
    pub(crate) local_files: FileTable,
    pub(crate) remote_files: FileTable,
    pub(crate) search_results: FileTable,
    pub(crate) consistency: Arc<dyn ConsistencyStrategy>,
    pub(crate) event_publisher: PeerEventSender,
}

impl NodeContext {
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// The advertised address of this peer
    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    pub fn peer_id(&self) -> i64 {
        self.peer_id
    }

    pub fn neighbors(&self) -> &NeighborDirectory {
        &self.neighbors
    }

    pub fn ledger(&self) -> &dyn MessageLedger {
        &*self.ledger
    }

    pub fn local_files(&self) -> &FileTable {
        &self.local_files
    }

    pub fn remote_files(&self) -> &FileTable {
        &self.remote_files
    }

    pub fn search_results(&self) -> &FileTable {
        &self.search_results
    }

    pub fn consistency(&self) -> &dyn ConsistencyStrategy {
        &*self.consistency
    }

    pub fn file_directory(&self) -> &Path {
        &self.config.file_directory
    }

    pub fn next_message_id(&self) -> MessageId {
        self.id_generator.next_id()
    }

    pub fn subscribe_events(&self) -> PeerEventReceiver {
        self.event_publisher.subscribe()
    }

    pub(crate) fn publish_event(&self, event: PeerEvent) {
        trace!(target: LOG_TARGET, "[{}] {}", self.address, event);
        // No subscribers is not an error
        let _ = self.event_publisher.send(Arc::new(event));
    }

    /// Returns a client for `address`, preferring the handle held in the neighbor directory
    pub async fn client_for(&self, address: &PeerAddress) -> Result<PeerClient, RpcError> {
        match self.neighbors.get(address).await {
            Some(client) => Ok(client),
            None => self.connector.connect(address).await,
        }
    }

    /// Resolves `file_name` against the local table first, then the remote table. A remote copy is only offered if it
    /// is valid and not expired, and is re-issued as a location pointing at this peer with this peer's default TTR.
    pub async fn resolve_file(&self, file_name: &str) -> Option<FileLocation> {
        if let Some(local) = self.local_files.find_by_name(file_name).await {
            return Some(local);
        }
        self.remote_files
            .find(|l| l.name() == file_name && l.is_usable())
            .await
            .map(|remote| remote.synthesize_for(self.address.clone(), self.config.default_ttr_secs()))
    }

    /// Waits for the configured per-hop propagation delay, if any
    pub(crate) async fn delay_propagation(&self) {
        if !self.config.propagation_delay.is_zero() {
            time::sleep(self.config.propagation_delay).await;
        }
    }

    /// Downloads the file described by `location` from its holder and records it as a remote file
    pub async fn download(&self, location: &FileLocation) -> Result<FileLocation, TransferError> {
        let result = async {
            let holder = self.client_for(location.owner()).await?;
            transfer::download_file(
                &holder,
                location,
                self.file_directory(),
                self.config.rpc.connect_timeout,
            )
            .await
        }
        .await;

        match result {
            Ok(n) => {
                info!(
                    target: LOG_TARGET,
                    "Downloaded '{}' ({} bytes) from {}",
                    location.name(),
                    n,
                    location.owner()
                );
                self.remote_files.insert(location.clone()).await;
                self.publish_event(PeerEvent::DownloadCompleted(location.clone()));
                Ok(location.clone())
            },
            Err(err) => {
                warn!(target: LOG_TARGET, "Download of '{}' failed: {}", location.name(), err);
                self.publish_event(PeerEvent::DownloadFailed {
                    file_name: location.name().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            },
        }
    }
}

#[async_trait]
impl InboundHandler for NodeContext {
    async fn handle(&self, message: InboundMessage) {
        match message {
            InboundMessage::Query(msg) => query::handle_query(self, msg).await,
            InboundMessage::HitQuery(msg) => query::handle_hit_query(self, msg).await,
            InboundMessage::Invalidate(msg) => self.consistency.on_invalidate(self, msg).await,
        }
    }
}
