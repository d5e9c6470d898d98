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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetAddressError {
    #[error("Address '{0}' is not of the form <host>:<port>")]
    MissingPort(String),
    #[error("Address '{0}' has an empty host")]
    EmptyHost(String),
    #[error("Invalid port in address '{0}'")]
    InvalidPort(String),
}

/// The advertised `host:port` of a peer. This is the address other peers use to reach the peer's RPC server and is
/// also the value a peer is identified by in neighbor and ledger tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerAddress {
    host: String,
    port: u16,
}

impl PeerAddress {
    pub fn new<T: Into<String>>(host: T, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns a copy of this address with a different port, used when the listener was bound to port 0
    pub fn with_port(&self, port: u16) -> Self {
        Self::new(self.host.clone(), port)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddress {
    type Err = NetAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| NetAddressError::MissingPort(s.to_string()))?;
        let host = host.trim();
        if host.is_empty() {
            return Err(NetAddressError::EmptyHost(s.to_string()));
        }
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| NetAddressError::InvalidPort(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let addr = "127.0.0.1:9900".parse::<PeerAddress>().unwrap();
        assert_eq!(addr.host(), "127.0.0.1");
        assert_eq!(addr.port(), 9900);
        assert_eq!(addr.to_string(), "127.0.0.1:9900");

        let addr = " localhost : 80 ".parse::<PeerAddress>().unwrap();
        assert_eq!(addr, PeerAddress::new("localhost", 80));
    }

    #[test]
    fn parse_malformed() {
        assert_eq!(
            "127.0.0.1".parse::<PeerAddress>().unwrap_err(),
            NetAddressError::MissingPort("127.0.0.1".to_string())
        );
        assert!(matches!(
            ":123".parse::<PeerAddress>().unwrap_err(),
            NetAddressError::EmptyHost(_)
        ));
        assert!(matches!(
            "host:99999".parse::<PeerAddress>().unwrap_err(),
            NetAddressError::InvalidPort(_)
        ));
        assert!(matches!(
            "host:abc".parse::<PeerAddress>().unwrap_err(),
            NetAddressError::InvalidPort(_)
        ));
    }
}
