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

//! Replica metadata for a file shared in the overlay.
//!
//! Every peer keeps two tables of `FileLocation`s:
//! - local locations describe files the peer owns. They always point at the peer itself, never expire and are always
//!   valid. Their version only changes through [FileLocation::touch].
//! - remote locations describe files downloaded from other peers. They point at the peer that served the file, and
//!   are subject to TTR decay and invalidation.
//!
//! A third list, the search results, holds locations received in response to queries.

use std::{fmt, hash::Hash};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::net_address::PeerAddress;

/// Version number of a freshly registered file
pub const INITIAL_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLocation {
    owner: PeerAddress,
    name: String,
    size: u64,
    version: u32,
    /// Seconds remaining before the replica is considered stale. Meaningless for local files.
    ttr: i64,
    valid: bool,
    expired: bool,
    timestamp: DateTime<Utc>,
}

impl FileLocation {
    pub fn new<T: Into<String>>(owner: PeerAddress, name: T, size: u64, version: u32, ttr: i64) -> Self {
        Self {
            owner,
            name: name.into(),
            size,
            version,
            ttr,
            valid: true,
            expired: ttr <= 0,
            timestamp: Utc::now(),
        }
    }

    /// Creates a location for a file that was just discovered on disk. Local files never expire, whatever `ttr` is.
    pub fn new_local<T: Into<String>>(owner: PeerAddress, name: T, size: u64, ttr: i64) -> Self {
        Self {
            expired: false,
            ..Self::new(owner, name, size, INITIAL_VERSION, ttr)
        }
    }

    /// Returns a new location describing this file as offered by `holder`. The version is carried over and the TTR is
    /// the holder's default. Used when a peer answers a query or poll from its remote table.
    pub fn synthesize_for(&self, holder: PeerAddress, ttr: i64) -> Self {
        Self::new(holder, self.name.clone(), self.size, self.version, ttr)
    }

    pub fn owner(&self) -> &PeerAddress {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn ttr(&self) -> i64 {
        self.ttr
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Bumps the version. Only the owning peer may call this on its local copy.
    pub fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.timestamp = Utc::now();
    }

    /// Decreases the TTR by `elapsed_secs`. Once the TTR crosses zero the location is expired and stays expired
    /// until `set_ttr` is called. Never called for local files.
    pub fn tick_ttr(&mut self, elapsed_secs: i64) {
        if self.expired {
            return;
        }
        self.ttr -= elapsed_secs;
        if self.ttr <= 0 {
            self.expired = true;
        }
    }

    pub fn set_ttr(&mut self, ttr: i64) {
        self.ttr = ttr;
        self.expired = false;
    }

    /// One-way. An invalid replica must be removed and re-obtained.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True if this replica can be offered to other peers
    pub fn is_usable(&self) -> bool {
        self.valid && !self.expired
    }

    pub fn is_owned_by(&self, address: &PeerAddress) -> bool {
        &self.owner == address
    }
}

impl PartialEq for FileLocation {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for FileLocation {}

impl Hash for FileLocation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}(version {})({} bytes)(TTR {})",
            self.name, self.owner, self.version, self.size, self.ttr
        )?;
        if !self.valid {
            f.write_str("(INVALID)")
        } else if self.expired {
            f.write_str("(TTR EXPIRED)")
        } else {
            Ok(())
        }
    }
}
