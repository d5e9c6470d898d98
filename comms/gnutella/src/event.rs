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

use std::{fmt, sync::Arc};

use tokio::sync::broadcast;

use crate::{file_location::FileLocation, message_id::MessageId, net_address::PeerAddress};

pub type PeerEventSender = broadcast::Sender<Arc<PeerEvent>>;
pub type PeerEventReceiver = broadcast::Receiver<Arc<PeerEvent>>;

/// Observable protocol progress of a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    NeighborAdded(PeerAddress),
    /// A query passed de-duplication and was resolved against the local tables
    QueryProcessed { message_id: MessageId, found: bool },
    /// A hit for a query originated by this peer arrived
    SearchResultReceived(FileLocation),
    LocalFileUpdated(FileLocation),
    ReplicaInvalidated(FileLocation),
    ReplicaExpired(FileLocation),
    ReplicaRenewed(FileLocation),
    DownloadCompleted(FileLocation),
    DownloadFailed { file_name: String, reason: String },
}

impl fmt::Display for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PeerEvent::*;
        match self {
            NeighborAdded(addr) => write!(f, "NeighborAdded({})", addr),
            QueryProcessed { message_id, found } => write!(f, "QueryProcessed({}, found={})", message_id, found),
            SearchResultReceived(loc) => write!(f, "SearchResultReceived({})", loc),
            LocalFileUpdated(loc) => write!(f, "LocalFileUpdated({})", loc),
            ReplicaInvalidated(loc) => write!(f, "ReplicaInvalidated({})", loc),
            ReplicaExpired(loc) => write!(f, "ReplicaExpired({})", loc),
            ReplicaRenewed(loc) => write!(f, "ReplicaRenewed({})", loc),
            DownloadCompleted(loc) => write!(f, "DownloadCompleted({})", loc),
            DownloadFailed { file_name, reason } => write!(f, "DownloadFailed({}: {})", file_name, reason),
        }
    }
}
