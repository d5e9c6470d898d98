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

use std::sync::Arc;

use chrono::Utc;
use log::*;
use tokio::sync::{broadcast, mpsc};

use super::{NodeContext, PeerNode, PeerNodeError, PeerRequestHandler};
use crate::{
    bounded_executor::BoundedExecutor,
    config::PeerConfig,
    consistency::{self, ConsistencyTask},
    file_table::FileTable,
    inbound::Inbound,
    ledger::{MessageLedger, UnboundedLedger},
    message_id::MessageIdGenerator,
    neighbors::NeighborDirectory,
    rpc::{Connector, MemoryNetwork, PeerRpcServer, PeerService, TcpConnector},
    shutdown::Shutdown,
    storage,
};

const LOG_TARGET: &str = "gnutella::node::builder";

enum Transport {
    Tcp,
    Memory(MemoryNetwork),
}

/// Assembles and starts a [PeerNode]
pub struct PeerNodeBuilder {
    config: PeerConfig,
    transport: Transport,
    ledger: Option<Arc<dyn MessageLedger>>,
    peer_id: Option<i64>,
}

impl PeerNodeBuilder {
    pub fn new(config: PeerConfig) -> Self {
        Self {
            config,
            transport: Transport::Tcp,
            ledger: None,
            peer_id: None,
        }
    }

    /// Attach the node to an in-process network instead of listening on TCP. If the configured listen port is 0 the
    /// network allocates an address. File transfers still use loopback TCP.
    pub fn with_memory_network(mut self, network: MemoryNetwork) -> Self {
        self.transport = Transport::Memory(network);
        self
    }

    /// Use `ledger` instead of the default [UnboundedLedger]
    pub fn with_ledger(mut self, ledger: Arc<dyn MessageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Override the peer id, which otherwise is the creation time in milliseconds
    pub fn with_peer_id(mut self, peer_id: i64) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    pub async fn build(self) -> Result<PeerNode, PeerNodeError> {
        let Self {
            config,
            transport,
            ledger,
            peer_id,
        } = self;
        config.validate()?;

        let shutdown = Shutdown::new();

        let (address, connector, server) = match &transport {
            Transport::Tcp => {
                let server = PeerRpcServer::bind(&config.listen_address, config.rpc).await?;
                let address = config.listen_address.with_port(server.local_addr()?.port());
                let connector: Arc<dyn Connector> = Arc::new(TcpConnector::new(config.rpc));
                (address, connector, Some(server))
            },
            Transport::Memory(network) => {
                let address = if config.listen_address.port() == 0 {
                    network.allocate_address()
                } else {
                    config.listen_address.clone()
                };
                if network.is_registered(&address).await {
                    return Err(PeerNodeError::AddressInUse(address));
                }
                let connector: Arc<dyn Connector> = Arc::new(network.connector());
                (address, connector, None)
            },
        };

        let peer_id = peer_id.unwrap_or_else(|| Utc::now().timestamp_millis());
        let local_files = storage::load_local_files(&config.file_directory, &address, config.default_ttr_secs())
            .await
            .map_err(PeerNodeError::Storage)?;
        let (event_publisher, _) = broadcast::channel(config.event_buffer_size);

        let context = Arc::new(NodeContext {
            id_generator: MessageIdGenerator::new(address.clone(), peer_id),
            address: address.clone(),
            peer_id,
            connector,
            neighbors: NeighborDirectory::new(),
            ledger: ledger.unwrap_or_else(|| Arc::new(UnboundedLedger::new())),
            local_files: FileTable::with_entries(local_files),
            remote_files: FileTable::new(),
            search_results: FileTable::new(),
            consistency: consistency::strategy_for(&config),
            event_publisher,
            config,
        });

        let (inbound_tx, inbound_rx) = mpsc::channel(context.config.inbound_buffer_size);
        let inbound = Inbound::new(
            BoundedExecutor::new(context.config.max_concurrent_inbound_tasks),
            inbound_rx,
            context.clone(),
            shutdown.to_signal(),
        );
        tokio::spawn(inbound.run());

        let handler: Arc<dyn PeerService> = Arc::new(PeerRequestHandler::new(context.clone(), inbound_tx));
        let memory_network = match transport {
            Transport::Tcp => {
                if let Some(server) = server {
                    tokio::spawn(server.run(handler, shutdown.to_signal()));
                }
                None
            },
            Transport::Memory(network) => {
                network.register(address.clone(), handler).await;
                Some(network)
            },
        };

        tokio::spawn(ConsistencyTask::new(context.clone(), shutdown.to_signal()).run());

        info!(
            target: LOG_TARGET,
            "Peer {} (id {}) started in {} mode sharing '{}'",
            address,
            peer_id,
            context.consistency().mode(),
            context.file_directory().display()
        );

        Ok(PeerNode::new(context, shutdown, memory_network))
    }
}
