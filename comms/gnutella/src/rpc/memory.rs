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

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU16, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use log::*;
use tokio::sync::RwLock;

use super::{Connector, PeerClient, PeerHandle, PeerRequest, PeerResponse, PeerService, RpcError};
use crate::net_address::PeerAddress;

const LOG_TARGET: &str = "gnutella::rpc::memory";

const FIRST_MEMORY_PORT: u16 = 20_000;

/// In-process stand-in for the network. Peers register their [PeerService] under their address and reach each
/// other through a [MemoryConnector]. Unregistering a peer makes it unreachable.
#[derive(Clone)]
pub struct MemoryNetwork {
    services: Arc<RwLock<HashMap<PeerAddress, Arc<dyn PeerService>>>>,
    next_port: Arc<AtomicU16>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self {
            services: Default::default(),
            next_port: Arc::new(AtomicU16::new(FIRST_MEMORY_PORT)),
        }
    }

    /// Returns a loopback address not yet handed out by this network
    pub fn allocate_address(&self) -> PeerAddress {
        PeerAddress::new("127.0.0.1", self.next_port.fetch_add(1, Ordering::SeqCst))
    }

    pub async fn register(&self, address: PeerAddress, service: Arc<dyn PeerService>) {
        debug!(target: LOG_TARGET, "Registering peer {}", address);
        self.services.write().await.insert(address, service);
    }

    pub async fn unregister(&self, address: &PeerAddress) {
        debug!(target: LOG_TARGET, "Unregistering peer {}", address);
        self.services.write().await.remove(address);
    }

    pub async fn is_registered(&self, address: &PeerAddress) -> bool {
        self.services.read().await.contains_key(address)
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector { network: self.clone() }
    }

    async fn service(&self, address: &PeerAddress) -> Option<Arc<dyn PeerService>> {
        self.services.read().await.get(address).cloned()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct MemoryConnector {
    network: MemoryNetwork,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, address: &PeerAddress) -> Result<PeerClient, RpcError> {
        if !self.network.is_registered(address).await {
            return Err(RpcError::PeerNotFound(address.clone()));
        }
        Ok(PeerClient::new(Arc::new(MemoryPeerHandle {
            address: address.clone(),
            network: self.network.clone(),
        })))
    }
}

struct MemoryPeerHandle {
    address: PeerAddress,
    network: MemoryNetwork,
}

#[async_trait]
impl PeerHandle for MemoryPeerHandle {
    fn address(&self) -> &PeerAddress {
        &self.address
    }

    async fn call(&self, request: PeerRequest) -> Result<PeerResponse, RpcError> {
        let service = self
            .network
            .service(&self.address)
            .await
            .ok_or_else(|| RpcError::PeerNotFound(self.address.clone()))?;
        trace!(target: LOG_TARGET, "Delivering {} to {}", request, self.address);
        Ok(service.handle(request).await)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct EchoService;

    #[async_trait]
    impl PeerService for EchoService {
        async fn handle(&self, request: PeerRequest) -> PeerResponse {
            match request {
                PeerRequest::Obtain(name) => PeerResponse::Obtain(name.len() as u16),
                _ => PeerResponse::Accepted,
            }
        }
    }

    #[tokio::test]
    async fn connect_and_call() {
        let network = MemoryNetwork::new();
        let address = network.allocate_address();
        network.register(address.clone(), Arc::new(EchoService)).await;

        let client = network.connector().connect(&address).await.unwrap();
        assert_eq!(client.address(), &address);
        assert_eq!(client.obtain("abc".to_string()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unregistered_peer_is_unreachable() {
        let network = MemoryNetwork::new();
        let address = network.allocate_address();
        assert!(matches!(
            network.connector().connect(&address).await,
            Err(RpcError::PeerNotFound(_))
        ));

        network.register(address.clone(), Arc::new(EchoService)).await;
        let client = network.connector().connect(&address).await.unwrap();
        network.unregister(&address).await;
        assert!(matches!(
            client.poll("a".to_string()).await,
            Err(RpcError::PeerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unexpected_response() {
        let network = MemoryNetwork::new();
        let address = network.allocate_address();
        network.register(address.clone(), Arc::new(EchoService)).await;
        let client = network.connector().connect(&address).await.unwrap();
        // EchoService answers a poll with Accepted
        assert!(matches!(
            client.poll("a".to_string()).await,
            Err(RpcError::UnexpectedResponse("poll"))
        ));
    }

    #[test]
    fn allocated_addresses_are_unique() {
        let network = MemoryNetwork::new();
        let a = network.allocate_address();
        let b = network.allocate_address();
        assert_ne!(a, b);
    }
}
