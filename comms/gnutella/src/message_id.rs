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
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net_address::{NetAddressError, PeerAddress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageIdParseError {
    #[error("Message id '{0}' is not of the form <addr>:<port>_<peerId>_<seq>")]
    Malformed(String),
    #[error("Message id has an invalid origin address: {0}")]
    InvalidOrigin(#[from] NetAddressError),
}

/// Globally unique identifier of a flooded message.
///
/// Rendered as `<originAddress>:<originPort>_<originPeerId>_<originSeq>`. The peer id disambiguates restarts of a peer
/// under the same address, the sequence number disambiguates messages from the same process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    origin: PeerAddress,
    peer_id: i64,
    seq: u64,
}

impl MessageId {
    pub fn new(origin: PeerAddress, peer_id: i64, seq: u64) -> Self {
        Self { origin, peer_id, seq }
    }

    pub fn origin(&self) -> &PeerAddress {
        &self.origin
    }

    pub fn peer_id(&self) -> i64 {
        self.peer_id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.origin, self.peer_id, self.seq)
    }
}

impl FromStr for MessageId {
    type Err = MessageIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MessageIdParseError::Malformed(s.to_string());
        let mut parts = s.rsplitn(3, '_');
        let seq = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let peer_id = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let origin = parts.next().ok_or_else(malformed)?.parse()?;
        Ok(Self { origin, peer_id, seq })
    }
}

/// Mints message ids for a single peer process
#[derive(Debug)]
pub struct MessageIdGenerator {
    origin: PeerAddress,
    peer_id: i64,
    next_seq: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new(origin: PeerAddress, peer_id: i64) -> Self {
        Self {
            origin,
            peer_id,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> MessageId {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        MessageId::new(self.origin.clone(), self.peer_id, seq)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_format() {
        let id = MessageId::new(PeerAddress::new("127.0.0.1", 9900), 1_600_000_000_000, 7);
        assert_eq!(id.to_string(), "127.0.0.1:9900_1600000000000_7");
    }

    #[test]
    fn parse_round_trip_with_underscore_host() {
        let id = MessageId::new(PeerAddress::new("my_host", 1), 42, 3);
        let parsed = id.to_string().parse::<MessageId>().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_malformed() {
        assert!(matches!(
            "127.0.0.1:9900_7".parse::<MessageId>(),
            Err(MessageIdParseError::Malformed(_))
        ));
        assert!(matches!(
            "127.0.0.1_1_7".parse::<MessageId>(),
            Err(MessageIdParseError::InvalidOrigin(_))
        ));
        assert!(matches!(
            "127.0.0.1:1_x_7".parse::<MessageId>(),
            Err(MessageIdParseError::Malformed(_))
        ));
    }

    #[test]
    fn generator_is_monotonic() {
        let gen = MessageIdGenerator::new(PeerAddress::new("127.0.0.1", 1), 5);
        let ids = (0..5).map(|_| gen.next_id()).collect::<Vec<_>>();
        assert!(ids.windows(2).all(|w| w[0].seq() < w[1].seq()));
        assert!(ids.iter().all(|id| id.peer_id() == 5));
    }

    #[test]
    fn restarts_produce_distinct_ids() {
        let addr = PeerAddress::new("127.0.0.1", 1);
        let first = MessageIdGenerator::new(addr.clone(), 100).next_id();
        let second = MessageIdGenerator::new(addr, 101).next_id();
        assert_eq!(first.seq(), second.seq());
        assert_ne!(first, second);
    }
}
