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

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net_address::PeerAddress;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("query_ttl must be greater than zero")]
    ZeroQueryTtl,
    #[error("default_ttr must be at least one second")]
    DefaultTtrTooShort,
    #[error("pull.interval must be at least one second")]
    PullIntervalTooShort,
    #[error("max_concurrent_inbound_tasks must be greater than zero")]
    ZeroInboundTasks,
    #[error("{0} must be greater than zero")]
    ZeroBufferSize(&'static str),
    #[error("Unknown consistency mode '{0}'. Expected 'push' or 'pull'")]
    UnknownConsistencyMode(String),
}

/// How replicas are kept consistent with their owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// The owner broadcasts an invalidation when a file is updated
    Push,
    /// Replica holders periodically poll the owner as their TTR runs out
    Pull,
}

impl Default for ConsistencyMode {
    fn default() -> Self {
        ConsistencyMode::Push
    }
}

impl fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyMode::Push => f.write_str("push"),
            ConsistencyMode::Pull => f.write_str("pull"),
        }
    }
}

impl FromStr for ConsistencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(ConsistencyMode::Push),
            "pull" => Ok(ConsistencyMode::Pull),
            other => Err(ConfigError::UnknownConsistencyMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    /// The address the RPC server binds to and advertises to other peers. Port 0 binds a random port.
    /// Default: 127.0.0.1:0
    pub listen_address: PeerAddress,
    /// Directory holding shared files and receiving downloads. Default: ./files
    pub file_directory: PathBuf,
    /// Default: push
    pub consistency_mode: ConsistencyMode,
    /// Hop budget for queries, hits and invalidations. Default: 10
    pub query_ttl: u32,
    /// TTR handed out with locations served by this peer. TTRs count whole seconds, so any sub-second part is
    /// dropped.
    /// Default: 30s
    #[serde(with = "serializers::seconds")]
    pub default_ttr: Duration,
    pub pull: PullConfig,
    /// Artificial delay applied before forwarding a flooded message, used to simulate network latency.
    /// Default: 0
    #[serde(with = "serializers::millis")]
    pub propagation_delay: Duration,
    /// How long a one-shot transfer listener waits for the downloader to connect.
    /// Default: 20s
    #[serde(with = "serializers::seconds")]
    pub transfer_accept_timeout: Duration,
    /// Capacity of the queue holding inbound fire-and-forget messages. Default: 1000
    pub inbound_buffer_size: usize,
    /// Maximum number of inbound messages processed concurrently. Default: 50
    pub max_concurrent_inbound_tasks: usize,
    /// Capacity of the event broadcast channel. Default: 100
    pub event_buffer_size: usize,
    pub rpc: RpcConfig,
}

impl PeerConfig {
    /// Settings suited to tests: fast pull cycles, short timeouts and a random local port
    pub fn default_local_test() -> Self {
        Self {
            listen_address: PeerAddress::new("127.0.0.1", 0),
            default_ttr: Duration::from_secs(30),
            pull: PullConfig {
                interval: Duration::from_secs(1),
                poll_threshold: Duration::from_secs(1),
            },
            transfer_accept_timeout: Duration::from_secs(5),
            rpc: RpcConfig {
                call_timeout: Duration::from_secs(5),
                connect_timeout: Duration::from_secs(2),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_ttl == 0 {
            return Err(ConfigError::ZeroQueryTtl);
        }
        if self.default_ttr.as_secs() == 0 {
            return Err(ConfigError::DefaultTtrTooShort);
        }
        if self.pull.interval.as_secs() == 0 {
            return Err(ConfigError::PullIntervalTooShort);
        }
        if self.max_concurrent_inbound_tasks == 0 {
            return Err(ConfigError::ZeroInboundTasks);
        }
        if self.inbound_buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize("inbound_buffer_size"));
        }
        if self.event_buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize("event_buffer_size"));
        }
        Ok(())
    }

    pub fn default_ttr_secs(&self) -> i64 {
        whole_secs(self.default_ttr)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        // NB: please remember to update field comments to reflect these defaults
        Self {
            listen_address: PeerAddress::new("127.0.0.1", 0),
            file_directory: PathBuf::from("files"),
            consistency_mode: ConsistencyMode::Push,
            query_ttl: 10,
            default_ttr: Duration::from_secs(30),
            pull: Default::default(),
            propagation_delay: Duration::from_millis(0),
            transfer_accept_timeout: Duration::from_secs(20),
            inbound_buffer_size: 1000,
            max_concurrent_inbound_tasks: 50,
            event_buffer_size: 100,
            rpc: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PullConfig {
    /// Interval of the TTR decay and poll cycle. Each cycle decreases every replica's TTR by this many whole seconds.
    /// Default: 5s
    #[serde(with = "serializers::seconds")]
    pub interval: Duration,
    /// Replicas whose TTR is at or below this many whole seconds are polled.
    /// Default: 5s
    #[serde(with = "serializers::seconds")]
    pub poll_threshold: Duration,
}

impl PullConfig {
    pub fn tick_secs(&self) -> i64 {
        whole_secs(self.interval)
    }

    pub fn poll_threshold_secs(&self) -> i64 {
        whole_secs(self.poll_threshold)
    }
}

/// TTR arithmetic is in whole seconds. Sub-second parts are truncated and oversized values saturate.
fn whole_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            poll_threshold: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcConfig {
    /// Upper bound on a single request/response exchange.
    /// Default: 10s
    #[serde(with = "serializers::seconds")]
    pub call_timeout: Duration,
    /// Upper bound on establishing a connection.
    /// Default: 5s
    #[serde(with = "serializers::seconds")]
    pub connect_timeout: Duration,
    /// Largest accepted frame. Default: 1 MiB
    pub max_frame_length: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_frame_length: 1024 * 1024,
        }
    }
}

pub mod serializers {
    pub mod seconds {
        //! Serialises a `Duration` as an integer number of seconds.
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where D: Deserializer<'de> {
            Ok(Duration::from_secs(u64::deserialize(deserializer)?))
        }

        pub fn serialize<S>(duration: &Duration, s: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            s.serialize_u64(duration.as_secs())
        }
    }

    pub mod millis {
        //! Serialises a `Duration` as an integer number of milliseconds.
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where D: Deserializer<'de> {
            Ok(Duration::from_millis(u64::deserialize(deserializer)?))
        }

        pub fn serialize<S>(duration: &Duration, s: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            s.serialize_u64(duration.as_millis() as u64)
        }
    }
}
