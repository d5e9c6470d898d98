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

use async_trait::async_trait;
use log::*;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::NodeContext;
use crate::{
    event::PeerEvent,
    inbound::InboundMessage,
    net_address::PeerAddress,
    rpc::{PeerRequest, PeerResponse, PeerService},
    transfer,
};

const LOG_TARGET: &str = "gnutella::node::handler";

/// Answers the peer-to-peer RPC surface of a node. `query`, `hitquery` and `invalidate` are queued for the inbound
/// pipeline and acknowledged straight away; `hello`, `poll` and `obtain` are answered in place.
pub struct PeerRequestHandler {
    context: Arc<NodeContext>,
    inbound_tx: mpsc::Sender<InboundMessage>,
}

impl PeerRequestHandler {
    pub fn new(context: Arc<NodeContext>, inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        Self { context, inbound_tx }
    }

    fn enqueue(&self, message: InboundMessage) -> PeerResponse {
        match self.inbound_tx.try_send(message) {
            Ok(()) => PeerResponse::Accepted,
            Err(TrySendError::Full(message)) => {
                warn!(
                    target: LOG_TARGET,
                    "[{}] Inbound queue full, dropping {}", self.context.address, message
                );
                PeerResponse::Error("Inbound queue is full".to_string())
            },
            Err(TrySendError::Closed(_)) => PeerResponse::Error("Peer is shutting down".to_string()),
        }
    }

    async fn handle_hello(&self, peer_address: PeerAddress) -> bool {
        if peer_address == self.context.address {
            return false;
        }
        match self.context.connector.connect(&peer_address).await {
            Ok(client) => {
                if self.context.neighbors.add(peer_address.clone(), client).await {
                    info!(
                        target: LOG_TARGET,
                        "[{}] {} is now a neighbor", self.context.address, peer_address
                    );
                    self.context.publish_event(PeerEvent::NeighborAdded(peer_address));
                }
                true
            },
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    "[{}] Hello from {} rejected, cannot reach it: {}", self.context.address, peer_address, err
                );
                false
            },
        }
    }

    async fn handle_obtain(&self, file_name: String) -> PeerResponse {
        let result = transfer::serve_file(
            self.context.file_directory(),
            &file_name,
            self.context.address.host(),
            self.context.config.transfer_accept_timeout,
        )
        .await;
        match result {
            Ok(port) => PeerResponse::Obtain(port),
            Err(err) => {
                debug!(
                    target: LOG_TARGET,
                    "[{}] Cannot serve '{}': {}", self.context.address, file_name, err
                );
                PeerResponse::Error(err.to_string())
            },
        }
    }
}

#[async_trait]
impl PeerService for PeerRequestHandler {
    async fn handle(&self, request: PeerRequest) -> PeerResponse {
        trace!(target: LOG_TARGET, "[{}] Received {}", self.context.address, request);
        match request {
            PeerRequest::Hello(peer_address) => PeerResponse::Hello(self.handle_hello(peer_address).await),
            PeerRequest::Query(msg) => self.enqueue(InboundMessage::Query(msg)),
            PeerRequest::HitQuery(msg) => self.enqueue(InboundMessage::HitQuery(msg)),
            PeerRequest::Invalidate(msg) => self.enqueue(InboundMessage::Invalidate(msg)),
            PeerRequest::Poll(file_name) => PeerResponse::Poll(self.context.resolve_file(&file_name).await),
            PeerRequest::Obtain(file_name) => self.handle_obtain(file_name).await,
        }
    }
}
