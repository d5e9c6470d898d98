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

use std::io;

use thiserror::Error;

use crate::{config::ConfigError, net_address::PeerAddress, rpc::RpcError, transfer::TransferError};

#[derive(Debug, Error)]
pub enum PeerNodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
    #[error("Failed to load shared files: {0}")]
    Storage(#[source] io::Error),
    #[error("No local file named '{0}'")]
    FileNotFound(String),
    #[error("Peer {0} rejected the hello")]
    HelloRejected(PeerAddress),
    #[error("A peer cannot be its own neighbor")]
    SelfConnect,
    #[error("Address {0} is already in use on this network")]
    AddressInUse(PeerAddress),
}
