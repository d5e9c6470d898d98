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

use std::{collections::HashMap, future::Future};

use futures::future;
use log::*;
use tokio::sync::RwLock;

use crate::{
    net_address::PeerAddress,
    rpc::{PeerClient, RpcError},
};

const LOG_TARGET: &str = "gnutella::neighbors";

/// The set of neighbors of a peer. Entries are added by the hello handshake and are never pruned; an unreachable
/// neighbor simply fails on its next use.
#[derive(Debug, Default)]
pub struct NeighborDirectory {
    neighbors: RwLock<HashMap<PeerAddress, PeerClient>>,
}

impl NeighborDirectory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds or replaces the handle for `address`. Returns true if the neighbor was not known before.
    pub async fn add(&self, address: PeerAddress, client: PeerClient) -> bool {
        let is_new = self.neighbors.write().await.insert(address.clone(), client).is_none();
        if is_new {
            debug!(target: LOG_TARGET, "Added neighbor {}", address);
        }
        is_new
    }

    pub async fn get(&self, address: &PeerAddress) -> Option<PeerClient> {
        self.neighbors.read().await.get(address).cloned()
    }

    pub async fn contains(&self, address: &PeerAddress) -> bool {
        self.neighbors.read().await.contains_key(address)
    }

    pub async fn values(&self) -> Vec<PeerClient> {
        self.neighbors.read().await.values().cloned().collect()
    }

    pub async fn addresses(&self) -> Vec<PeerAddress> {
        let mut addresses = self.neighbors.read().await.keys().cloned().collect::<Vec<_>>();
        addresses.sort();
        addresses
    }

    pub async fn len(&self) -> usize {
        self.neighbors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Calls `f` concurrently for every neighbor except `excluded`, over a snapshot of the directory. A failing call
    /// is logged and does not affect the others. Returns the number of neighbors that were reached successfully.
    pub async fn for_each_except<F, Fut>(&self, excluded: Option<&PeerAddress>, f: F) -> usize
    where
        F: Fn(PeerClient) -> Fut,
        Fut: Future<Output = Result<(), RpcError>>,
    {
        let targets = self
            .values()
            .await
            .into_iter()
            .filter(|client| excluded.map(|ex| client.address() != ex).unwrap_or(true))
            .collect::<Vec<_>>();

        let calls = targets.into_iter().map(|client| {
            let address = client.address().clone();
            let fut = f(client);
            async move { (address, fut.await) }
        });

        future::join_all(calls)
            .await
            .into_iter()
            .filter(|(address, result)| match result {
                Ok(_) => true,
                Err(err) => {
                    warn!(target: LOG_TARGET, "Failed to contact neighbor {}: {}", address, err);
                    false
                },
            })
            .count()
    }
}
