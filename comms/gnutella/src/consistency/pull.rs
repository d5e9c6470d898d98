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

use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use log::*;

use super::ConsistencyStrategy;
use crate::{
    config::{ConsistencyMode, PullConfig},
    event::PeerEvent,
    file_location::FileLocation,
    node::NodeContext,
    rpc::InvalidateMessage,
};

const LOG_TARGET: &str = "gnutella::consistency::pull";

/// Holder-driven consistency. Every tick decays the TTR of all valid replicas by the tick length and polls the owner
/// of each replica whose TTR is at or below the poll threshold.
#[derive(Debug, Clone)]
pub struct PullConsistency {
    config: PullConfig,
}

impl PullConsistency {
    pub fn new(config: PullConfig) -> Self {
        Self { config }
    }

    async fn poll_owner(&self, context: &NodeContext, replica: FileLocation) {
        let result = async {
            let owner = context.client_for(replica.owner()).await?;
            owner.poll(replica.name().to_string()).await
        }
        .await;

        match result {
            Ok(Some(fresh)) if fresh.version() <= replica.version() => {
                let ttr = fresh.ttr();
                if let Some(renewed) = context.remote_files.update(&replica, |l| l.set_ttr(ttr)).await {
                    debug!(target: LOG_TARGET, "[{}] Replica {} renewed", context.address, renewed);
                    context.publish_event(PeerEvent::ReplicaRenewed(renewed));
                }
            },
            Ok(Some(fresh)) => {
                info!(
                    target: LOG_TARGET,
                    "[{}] Owner reports version {} of '{}', replica has version {}",
                    context.address,
                    fresh.version(),
                    replica.name(),
                    replica.version()
                );
                invalidate(context, &replica).await;
            },
            Ok(None) => {
                info!(
                    target: LOG_TARGET,
                    "[{}] {} no longer offers '{}'",
                    context.address,
                    replica.owner(),
                    replica.name()
                );
                invalidate(context, &replica).await;
            },
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    "[{}] Could not poll {} for '{}': {}",
                    context.address,
                    replica.owner(),
                    replica.name(),
                    err
                );
                invalidate(context, &replica).await;
            },
        }
    }
}

async fn invalidate(context: &NodeContext, replica: &FileLocation) {
    if let Some(invalidated) = context.remote_files.update(replica, |l| l.invalidate()).await {
        context.publish_event(PeerEvent::ReplicaInvalidated(invalidated));
    }
}

#[async_trait]
impl ConsistencyStrategy for PullConsistency {
    fn mode(&self) -> ConsistencyMode {
        ConsistencyMode::Pull
    }

    async fn on_local_update(&self, context: &NodeContext, location: &FileLocation) {
        debug!(
            target: LOG_TARGET,
            "[{}] Local update of {} will be picked up by polling replica holders", context.address, location
        );
    }

    async fn on_invalidate(&self, context: &NodeContext, message: InvalidateMessage) {
        trace!(
            target: LOG_TARGET,
            "[{}] Ignoring invalidation {} in pull mode", context.address, message.message_id
        );
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(self.config.interval)
    }

    async fn on_tick(&self, context: &NodeContext) {
        let tick_secs = self.config.tick_secs();
        let threshold = self.config.poll_threshold_secs();

        let mut expired = Vec::new();
        let due = context
            .remote_files
            .update_all(|replica| {
                if !replica.is_valid() {
                    return false;
                }
                let was_expired = replica.is_expired();
                replica.tick_ttr(tick_secs);
                if !was_expired && replica.is_expired() {
                    expired.push(replica.clone());
                }
                replica.is_expired() || replica.ttr() <= threshold
            })
            .await;

        for replica in expired {
            debug!(target: LOG_TARGET, "[{}] Replica {} expired", context.address, replica);
            context.publish_event(PeerEvent::ReplicaExpired(replica));
        }

        if due.is_empty() {
            return;
        }
        trace!(
            target: LOG_TARGET,
            "[{}] Polling owners of {} replica(s)", context.address, due.len()
        );
        future::join_all(due.into_iter().map(|replica| self.poll_owner(context, replica))).await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::PeerConfig,
        message_id::MessageId,
        net_address::PeerAddress,
        test_utils::{TestNetwork, TestPeer},
    };

    fn pull_consistency() -> PullConsistency {
        PullConsistency::new(PullConfig {
            interval: Duration::from_secs(1),
            poll_threshold: Duration::from_secs(1),
        })
    }

    async fn holder_and_owner() -> (TestNetwork, TestPeer, TestPeer) {
        let network = TestNetwork::new();
        // The holder runs push mode so that its own background task does not tick the replicas under test
        let holder = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = network
            .spawn_peer(PeerConfig::default_local_test(), &[("f", "v1")])
            .await;
        (network, holder, owner)
    }

    #[tokio::test]
    async fn ignores_invalidations() {
        let (_network, holder, owner) = holder_and_owner().await;
        let remote = holder.context().remote_files();
        remote.insert(FileLocation::new(owner.address().clone(), "f", 2, 1, 30)).await;
        pull_consistency()
            .on_invalidate(holder.context(), InvalidateMessage {
                message_id: MessageId::new(owner.address().clone(), 1, 1),
                ttl: 10,
                file_name: "f".to_string(),
                location: FileLocation::new(owner.address().clone(), "f", 2, 2, 30),
                sender: owner.address().clone(),
            })
            .await;
        assert!(remote.snapshot().await[0].is_valid());
    }

    #[tokio::test]
    async fn tick_decays_ttr_without_polling_fresh_replicas() {
        let (_network, holder, owner) = holder_and_owner().await;
        let remote = holder.context().remote_files();
        remote.insert(FileLocation::new(owner.address().clone(), "f", 2, 1, 10)).await;
        pull_consistency().on_tick(holder.context()).await;
        let replica = &remote.snapshot().await[0];
        assert_eq!(replica.ttr(), 9);
        assert!(replica.is_valid());
    }

    #[tokio::test]
    async fn near_expiry_replica_is_renewed() {
        let (_network, holder, owner) = holder_and_owner().await;
        let remote = holder.context().remote_files();
        remote.insert(FileLocation::new(owner.address().clone(), "f", 2, 1, 1)).await;
        let mut events = holder.subscribe_events();

        pull_consistency().on_tick(holder.context()).await;

        let replica = &remote.snapshot().await[0];
        assert!(replica.is_valid());
        assert!(!replica.is_expired());
        assert_eq!(replica.ttr(), owner.config().default_ttr_secs());
        assert!(matches!(&*events.try_recv().unwrap(), PeerEvent::ReplicaExpired(_)));
        assert!(matches!(&*events.try_recv().unwrap(), PeerEvent::ReplicaRenewed(_)));
    }

    #[tokio::test]
    async fn newer_owner_version_invalidates() {
        let (_network, holder, owner) = holder_and_owner().await;
        let remote = holder.context().remote_files();
        remote.insert(FileLocation::new(owner.address().clone(), "f", 2, 1, 2)).await;
        owner.touch("f").await.unwrap();

        pull_consistency().on_tick(holder.context()).await;
        let replica = &remote.snapshot().await[0];
        assert!(!replica.is_valid());
        assert_eq!(replica.version(), 1);

        // Invalid replicas are no longer ticked
        pull_consistency().on_tick(holder.context()).await;
        assert_eq!(remote.snapshot().await[0].ttr(), 1);
    }

    #[tokio::test]
    async fn unreachable_or_missing_owner_invalidates() {
        let (_network, holder, owner) = holder_and_owner().await;
        let remote = holder.context().remote_files();
        remote
            .insert(FileLocation::new(PeerAddress::new("127.0.0.1", 1), "f", 2, 1, 1))
            .await;
        remote.insert(FileLocation::new(owner.address().clone(), "gone", 2, 1, 1)).await;

        pull_consistency().on_tick(holder.context()).await;
        assert!(remote.snapshot().await.iter().all(|l| !l.is_valid()));
    }
}
