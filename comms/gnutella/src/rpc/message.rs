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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{file_location::FileLocation, message_id::MessageId, net_address::PeerAddress};

/// A file search being flooded through the overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMessage {
    pub message_id: MessageId,
    pub ttl: u32,
    pub file_name: String,
    /// The peer that sent this copy of the query (not necessarily the origin)
    pub sender: PeerAddress,
}

/// A search result travelling back along the reverse path of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitQueryMessage {
    pub message_id: MessageId,
    pub ttl: u32,
    pub file_name: String,
    pub location: FileLocation,
}

/// Push-mode notice that the owner of `location` has a newer version of the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidateMessage {
    pub message_id: MessageId,
    pub ttl: u32,
    pub file_name: String,
    pub location: FileLocation,
    pub sender: PeerAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRequest {
    Hello(PeerAddress),
    Query(QueryMessage),
    HitQuery(HitQueryMessage),
    Invalidate(InvalidateMessage),
    Poll(String),
    Obtain(String),
}

impl PeerRequest {
    pub fn as_type_str(&self) -> &'static str {
        use PeerRequest::*;
        match self {
            Hello(_) => "hello",
            Query(_) => "query",
            HitQuery(_) => "hitquery",
            Invalidate(_) => "invalidate",
            Poll(_) => "poll",
            Obtain(_) => "obtain",
        }
    }
}

impl fmt::Display for PeerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PeerRequest::*;
        match self {
            Hello(addr) => write!(f, "Hello({})", addr),
            Query(msg) => write!(
                f,
                "Query({}, ttl={}, name={}, sender={})",
                msg.message_id, msg.ttl, msg.file_name, msg.sender
            ),
            HitQuery(msg) => write!(
                f,
                "HitQuery({}, ttl={}, name={}, location={})",
                msg.message_id, msg.ttl, msg.file_name, msg.location
            ),
            Invalidate(msg) => write!(
                f,
                "Invalidate({}, ttl={}, name={}, sender={})",
                msg.message_id, msg.ttl, msg.file_name, msg.sender
            ),
            Poll(name) => write!(f, "Poll({})", name),
            Obtain(name) => write!(f, "Obtain({})", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerResponse {
    Hello(bool),
    /// A fire-and-forget message was accepted for processing
    Accepted,
    Poll(Option<FileLocation>),
    Obtain(u16),
    Error(String),
}
