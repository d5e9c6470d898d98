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

//! # Gnutella comms
//!
//! An unstructured peer-to-peer overlay in the style of Gnutella. Peers know a handful of neighbors and find files by
//! flooding queries with a hop budget (TTL). Duplicate floods are suppressed with a ledger of seen message ids, which
//! also records the reverse path that search hits travel back on.
//!
//! Downloaded copies (replicas) are kept consistent with their owner in one of two modes:
//! - push: the owner floods an invalidation whenever it updates a file.
//! - pull: replica holders let a time-to-refresh (TTR) run down and poll the owner as it nears zero.
//!
//! Start with [PeerNodeBuilder](node::PeerNodeBuilder). Peers talk over TCP, or over an in-process
//! [MemoryNetwork](rpc::MemoryNetwork) for simulations and tests.

#[macro_use]
pub mod test_utils;

pub mod bounded_executor;
pub mod config;
pub mod consistency;
pub mod event;
pub mod file_location;
pub mod file_table;
pub mod inbound;
pub mod ledger;
pub mod message_id;
pub mod neighbors;
pub mod net_address;
pub mod node;
pub mod query;
pub mod rpc;
pub mod shutdown;
pub mod storage;
pub mod transfer;

pub use config::{ConsistencyMode, PeerConfig};
pub use event::PeerEvent;
pub use file_location::FileLocation;
pub use message_id::MessageId;
pub use net_address::PeerAddress;
pub use node::{PeerNode, PeerNodeBuilder, PeerNodeError};
