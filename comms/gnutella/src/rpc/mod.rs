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

//! Peer-to-peer RPC surface.
//!
//! Every peer both exposes and consumes the same six calls: `hello`, `query`, `hitquery`, `invalidate`, `poll` and
//! `obtain`. A [PeerHandle] is a live handle to a remote peer, a [Connector] looks up (or opens) handles by address
//! and a [PeerService] answers inbound requests.
//!
//! Two transports are provided: TCP (length-delimited bincode frames) and an in-process [MemoryNetwork] used to
//! simulate overlays in tests.

mod error;
pub use error::RpcError;

mod memory;
pub use memory::{MemoryConnector, MemoryNetwork};

pub mod message;
pub use message::{HitQueryMessage, InvalidateMessage, PeerRequest, PeerResponse, QueryMessage};

mod server;
pub use server::PeerRpcServer;

mod tcp;
pub use tcp::{TcpConnector, TcpPeerClient};

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{file_location::FileLocation, net_address::PeerAddress};

/// A live handle to a remote peer
#[async_trait]
pub trait PeerHandle: Send + Sync {
    /// The advertised address of the remote peer. Handles are compared by this value.
    fn address(&self) -> &PeerAddress;

    async fn call(&self, request: PeerRequest) -> Result<PeerResponse, RpcError>;
}

/// Answers requests from remote peers
#[async_trait]
pub trait PeerService: Send + Sync {
    async fn handle(&self, request: PeerRequest) -> PeerResponse;
}

/// Resolves peer addresses to handles
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &PeerAddress) -> Result<PeerClient, RpcError>;
}

/// Typed client over a [PeerHandle]
#[derive(Clone)]
pub struct PeerClient {
    handle: Arc<dyn PeerHandle>,
}

impl PeerClient {
    pub fn new(handle: Arc<dyn PeerHandle>) -> Self {
        Self { handle }
    }

    pub fn address(&self) -> &PeerAddress {
        self.handle.address()
    }

    pub async fn hello(&self, peer_address: PeerAddress) -> Result<bool, RpcError> {
        match self.call(PeerRequest::Hello(peer_address)).await? {
            PeerResponse::Hello(accepted) => Ok(accepted),
            _ => Err(RpcError::UnexpectedResponse("hello")),
        }
    }

    pub async fn query(&self, message: QueryMessage) -> Result<(), RpcError> {
        self.expect_accepted(PeerRequest::Query(message), "query").await
    }

    pub async fn hit_query(&self, message: HitQueryMessage) -> Result<(), RpcError> {
        self.expect_accepted(PeerRequest::HitQuery(message), "hitquery").await
    }

    pub async fn invalidate(&self, message: InvalidateMessage) -> Result<(), RpcError> {
        self.expect_accepted(PeerRequest::Invalidate(message), "invalidate")
            .await
    }

    pub async fn poll(&self, file_name: String) -> Result<Option<FileLocation>, RpcError> {
        match self.call(PeerRequest::Poll(file_name)).await? {
            PeerResponse::Poll(location) => Ok(location),
            _ => Err(RpcError::UnexpectedResponse("poll")),
        }
    }

    pub async fn obtain(&self, file_name: String) -> Result<u16, RpcError> {
        match self.call(PeerRequest::Obtain(file_name)).await? {
            PeerResponse::Obtain(port) => Ok(port),
            _ => Err(RpcError::UnexpectedResponse("obtain")),
        }
    }

    async fn expect_accepted(&self, request: PeerRequest, kind: &'static str) -> Result<(), RpcError> {
        match self.call(request).await? {
            PeerResponse::Accepted => Ok(()),
            _ => Err(RpcError::UnexpectedResponse(kind)),
        }
    }

    async fn call(&self, request: PeerRequest) -> Result<PeerResponse, RpcError> {
        match self.handle.call(request).await? {
            PeerResponse::Error(err) => Err(RpcError::Remote(err)),
            resp => Ok(resp),
        }
    }
}

impl fmt::Debug for PeerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerClient").field("address", self.address()).finish()
    }
}

impl PartialEq for PeerClient {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}
