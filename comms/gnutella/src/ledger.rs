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

//! Seen-messages ledger.
//!
//! Maps a message id to the neighbor it was first received from. The ledger is used both to drop duplicate floods
//! and to route hits back along the reverse path of a query.

use std::collections::HashMap;

use async_trait::async_trait;
use log::*;
use tokio::sync::RwLock;

use crate::{message_id::MessageId, net_address::PeerAddress};

const LOG_TARGET: &str = "gnutella::ledger";

/// Where a message was first seen from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOrigin {
    /// The message was minted by this peer
    Local,
    /// The message arrived from the neighbor with this address
    Neighbor(PeerAddress),
}

#[async_trait]
pub trait MessageLedger: Send + Sync {
    /// Records `origin` for `message_id` if the id has not been seen before. Returns true if the entry was inserted,
    /// false if the message is a duplicate. The first writer always wins.
    async fn insert_if_absent(&self, message_id: MessageId, origin: MessageOrigin) -> bool;

    /// Returns the recorded origin of `message_id`, if any
    async fn origin_of(&self, message_id: &MessageId) -> Option<MessageOrigin>;

    async fn len(&self) -> usize;
}

/// Ledger that never evicts. Memory grows with the number of distinct messages seen by the process.
#[derive(Debug, Default)]
pub struct UnboundedLedger {
    entries: RwLock<HashMap<MessageId, MessageOrigin>>,
}

impl UnboundedLedger {
    pub fn new() -> Self {
        Default::default()
    }
}

#[async_trait]
impl MessageLedger for UnboundedLedger {
    async fn insert_if_absent(&self, message_id: MessageId, origin: MessageOrigin) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&message_id) {
            trace!(target: LOG_TARGET, "Message {} already in ledger", message_id);
            return false;
        }
        trace!(target: LOG_TARGET, "Recording message {} from {:?}", message_id, origin);
        entries.insert(message_id, origin);
        true
    }

    async fn origin_of(&self, message_id: &MessageId) -> Option<MessageOrigin> {
        self.entries.read().await.get(message_id).cloned()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
