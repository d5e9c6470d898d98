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

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::*;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    net::TcpStream,
    sync::{Mutex, RwLock},
    time,
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use super::{Connector, PeerClient, PeerHandle, PeerRequest, PeerResponse, RpcError};
use crate::{config::RpcConfig, net_address::PeerAddress};

const LOG_TARGET: &str = "gnutella::rpc::tcp";

pub(super) type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

pub(super) fn framed(socket: TcpStream, config: &RpcConfig) -> FramedStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(config.max_frame_length)
        .new_codec();
    Framed::new(socket, codec)
}

pub(super) async fn write_frame<T: Serialize>(framed: &mut FramedStream, value: &T) -> Result<(), RpcError> {
    let bytes = bincode::serialize(value)?;
    framed.send(Bytes::from(bytes)).await?;
    Ok(())
}

/// Reads the next frame. Returns `Ok(None)` if the remote closed the connection.
pub(super) async fn read_frame<T: DeserializeOwned>(framed: &mut FramedStream) -> Result<Option<T>, RpcError> {
    match framed.next().await {
        Some(frame) => {
            let frame = frame?;
            Ok(Some(bincode::deserialize(&frame)?))
        },
        None => Ok(None),
    }
}

/// Client for a single remote peer. Calls are serialised over one connection which is re-established on the next
/// call after any failure.
pub struct TcpPeerClient {
    address: PeerAddress,
    config: RpcConfig,
    connection: Mutex<Option<FramedStream>>,
}

impl TcpPeerClient {
    pub fn new(address: PeerAddress, config: RpcConfig) -> Self {
        Self {
            address,
            config,
            connection: Mutex::new(None),
        }
    }

    /// Opens the connection if it is not already open
    pub async fn connect(&self) -> Result<(), RpcError> {
        let mut lock = self.connection.lock().await;
        if lock.is_none() {
            *lock = Some(self.open().await?);
        }
        Ok(())
    }

    async fn open(&self) -> Result<FramedStream, RpcError> {
        let addr = (self.address.host(), self.address.port());
        let socket = time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| RpcError::Timeout(self.address.clone()))?
            .map_err(|err| RpcError::ConnectFailed {
                address: self.address.clone(),
                details: err.to_string(),
            })?;
        socket.set_nodelay(true)?;
        debug!(target: LOG_TARGET, "Connected to peer {}", self.address);
        Ok(framed(socket, &self.config))
    }

    async fn exchange(
        framed: &mut FramedStream,
        address: &PeerAddress,
        request: &PeerRequest,
    ) -> Result<PeerResponse, RpcError> {
        write_frame(framed, request).await?;
        read_frame(framed)
            .await?
            .ok_or_else(|| RpcError::ConnectionClosed(address.clone()))
    }
}

#[async_trait]
impl PeerHandle for TcpPeerClient {
    fn address(&self) -> &PeerAddress {
        &self.address
    }

    async fn call(&self, request: PeerRequest) -> Result<PeerResponse, RpcError> {
        let mut lock = self.connection.lock().await;
        let mut framed = match lock.take() {
            Some(framed) => framed,
            None => self.open().await?,
        };

        trace!(target: LOG_TARGET, "Sending {} to {}", request, self.address);
        match time::timeout(
            self.config.call_timeout,
            Self::exchange(&mut framed, &self.address, &request),
        )
        .await
        {
            Ok(Ok(response)) => {
                // Only a connection that completed an exchange is kept for reuse
                *lock = Some(framed);
                Ok(response)
            },
            Ok(Err(err)) => Err(err),
            Err(_) => Err(RpcError::Timeout(self.address.clone())),
        }
    }
}

/// Connector that keeps one [TcpPeerClient] per remote address
#[derive(Clone)]
pub struct TcpConnector {
    config: RpcConfig,
    clients: Arc<RwLock<HashMap<PeerAddress, Arc<TcpPeerClient>>>>,
}

impl TcpConnector {
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            clients: Default::default(),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &PeerAddress) -> Result<PeerClient, RpcError> {
        if let Some(client) = self.clients.read().await.get(address) {
            return Ok(PeerClient::new(client.clone()));
        }

        let client = Arc::new(TcpPeerClient::new(address.clone(), self.config));
        client.connect().await?;
        let client = self
            .clients
            .write()
            .await
            .entry(address.clone())
            .or_insert(client)
            .clone();
        Ok(PeerClient::new(client))
    }
}
