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

use std::{net::SocketAddr, sync::Arc};

use log::*;
use tokio::{
    net::{TcpListener, TcpStream},
    task,
};

use super::{
    tcp::{framed, read_frame, write_frame},
    PeerRequest,
    PeerService,
    RpcError,
};
use crate::{config::RpcConfig, net_address::PeerAddress, shutdown::ShutdownSignal};

const LOG_TARGET: &str = "gnutella::rpc::server";

/// Accepts TCP connections from other peers and answers their requests using a [PeerService]. Each connection is
/// served on its own task.
pub struct PeerRpcServer {
    listener: TcpListener,
    config: RpcConfig,
}

impl PeerRpcServer {
    pub async fn bind(address: &PeerAddress, config: RpcConfig) -> Result<Self, RpcError> {
        let listener = TcpListener::bind((address.host(), address.port())).await?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, service: Arc<dyn PeerService>, mut shutdown_signal: ShutdownSignal) {
        info!(
            target: LOG_TARGET,
            "Peer RPC server listening on {}",
            self.listener
                .local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "<unknown>".to_string())
        );
        loop {
            tokio::select! {
                _ = shutdown_signal.wait() => {
                    info!(target: LOG_TARGET, "Peer RPC server shutting down");
                    break;
                },
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, remote_addr)) => {
                        debug!(target: LOG_TARGET, "Accepted connection from {}", remote_addr);
                        task::spawn(Self::serve_connection(
                            socket,
                            remote_addr,
                            self.config,
                            service.clone(),
                            shutdown_signal.clone(),
                        ));
                    },
                    Err(err) => {
                        warn!(target: LOG_TARGET, "Failed to accept connection: {}", err);
                    },
                },
            }
        }
    }

    async fn serve_connection(
        socket: TcpStream,
        remote_addr: SocketAddr,
        config: RpcConfig,
        service: Arc<dyn PeerService>,
        mut shutdown_signal: ShutdownSignal,
    ) {
        if let Err(err) = socket.set_nodelay(true) {
            debug!(target: LOG_TARGET, "Unable to set TCP_NODELAY for {}: {}", remote_addr, err);
        }
        let mut framed = framed(socket, &config);
        loop {
            let request = tokio::select! {
                _ = shutdown_signal.wait() => break,
                request = read_frame::<PeerRequest>(&mut framed) => request,
            };

            let request = match request {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!(target: LOG_TARGET, "Connection from {} closed", remote_addr);
                    break;
                },
                Err(err) => {
                    warn!(
                        target: LOG_TARGET,
                        "Dropping connection from {} after a bad frame: {}", remote_addr, err
                    );
                    break;
                },
            };

            trace!(target: LOG_TARGET, "Received {} from {}", request, remote_addr);
            let response = service.handle(request).await;
            if let Err(err) = write_frame(&mut framed, &response).await {
                debug!(
                    target: LOG_TARGET,
                    "Failed to send response to {}: {}", remote_addr, err
                );
                break;
            }
        }
    }
}
