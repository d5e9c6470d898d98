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

use async_trait::async_trait;
use log::*;

use super::ConsistencyStrategy;
use crate::{
    config::ConsistencyMode,
    event::PeerEvent,
    file_location::FileLocation,
    ledger::MessageOrigin,
    node::NodeContext,
    rpc::InvalidateMessage,
};

const LOG_TARGET: &str = "gnutella::consistency::push";

/// Owner-driven invalidation. An update is flooded to the whole overlay (within the query TTL) using the same
/// ledger de-duplication as queries.
///
/// A notice invalidates every valid replica with the same name and a lower version, whoever the owner is. An
/// unrelated file that happens to share the name with a file from another owner can therefore be invalidated too.
#[derive(Debug, Default, Clone)]
pub struct PushConsistency;

impl PushConsistency {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConsistencyStrategy for PushConsistency {
    fn mode(&self) -> ConsistencyMode {
        ConsistencyMode::Push
    }

    async fn on_local_update(&self, context: &NodeContext, location: &FileLocation) {
        let message_id = context.next_message_id();
        context
            .ledger
            .insert_if_absent(message_id.clone(), MessageOrigin::Local)
            .await;
        let message = InvalidateMessage {
            message_id: message_id.clone(),
            ttl: context.config.query_ttl,
            file_name: location.name().to_string(),
            location: location.clone(),
            sender: context.address.clone(),
        };
        let reached = context
            .neighbors
            .for_each_except(None, |client| {
                let message = message.clone();
                async move { client.invalidate(message).await }
            })
            .await;
        info!(
            target: LOG_TARGET,
            "[{}] Invalidation {} for {} sent to {} neighbor(s)", context.address, message_id, location, reached
        );
    }

    /// Marks matching replicas invalid, then forwards the notice with one less hop. Matching is by name and version
    /// only, so same-name replicas of other owners' files are included.
    async fn on_invalidate(&self, context: &NodeContext, message: InvalidateMessage) {
        let InvalidateMessage {
            message_id,
            ttl,
            file_name,
            location,
            sender,
        } = message;

        if ttl == 0 {
            debug!(target: LOG_TARGET, "Discarding invalidation {} with exhausted TTL", message_id);
            return;
        }
        if !context
            .ledger
            .insert_if_absent(message_id.clone(), MessageOrigin::Neighbor(sender.clone()))
            .await
        {
            trace!(
                target: LOG_TARGET,
                "[{}] Duplicate invalidation {} dropped", context.address, message_id
            );
            return;
        }

        let invalidated = context
            .remote_files
            .update_all(|replica| {
                if replica.name() == file_name && replica.is_valid() && replica.version() < location.version() {
                    replica.invalidate();
                    true
                } else {
                    false
                }
            })
            .await;
        for replica in invalidated {
            info!(
                target: LOG_TARGET,
                "[{}] Replica {} invalidated by {}", context.address, replica, location
            );
            context.publish_event(PeerEvent::ReplicaInvalidated(replica));
        }

        let new_ttl = ttl - 1;
        if new_ttl == 0 {
            return;
        }
        context.delay_propagation().await;
        let forward = InvalidateMessage {
            message_id: message_id.clone(),
            ttl: new_ttl,
            file_name,
            location,
            sender: context.address.clone(),
        };
        let reached = context
            .neighbors
            .for_each_except(Some(&sender), |client| {
                let forward = forward.clone();
                async move { client.invalidate(forward).await }
            })
            .await;
        trace!(
            target: LOG_TARGET,
            "[{}] Invalidation {} forwarded to {} neighbor(s)", context.address, message_id, reached
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::PeerConfig, message_id::MessageId, net_address::PeerAddress, test_utils::TestNetwork};

    fn notice(seq: u64, owner: &PeerAddress, version: u32) -> InvalidateMessage {
        InvalidateMessage {
            message_id: MessageId::new(owner.clone(), 1, seq),
            ttl: 10,
            file_name: "f".to_string(),
            location: FileLocation::new(owner.clone(), "f", 1, version, 30),
            sender: PeerAddress::new("127.0.0.1", 2),
        }
    }

    #[tokio::test]
    async fn invalidates_older_replicas_only() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 1);
        let relay = PeerAddress::new("127.0.0.1", 3);
        let remote = peer.context().remote_files();
        remote.insert(FileLocation::new(owner.clone(), "f", 1, 1, 30)).await;
        remote.insert(FileLocation::new(relay, "f", 1, 1, 30)).await;
        remote.insert(FileLocation::new(owner.clone(), "other", 1, 1, 30)).await;
        let mut events = peer.subscribe_events();

        PushConsistency::new()
            .on_invalidate(peer.context(), notice(1, &owner, 2))
            .await;

        let replicas = remote.snapshot().await;
        assert!(!replicas[0].is_valid());
        // Copies obtained from another holder of the same file are stale too
        assert!(!replicas[1].is_valid());
        assert!(replicas[2].is_valid());
        let event = events.try_recv().unwrap();
        assert!(matches!(&*event, PeerEvent::ReplicaInvalidated(l) if l.name() == "f"));
    }

    #[tokio::test]
    async fn same_name_from_other_owner_is_compared_by_version() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 1);
        let remote = peer.context().remote_files();
        remote
            .insert(FileLocation::new(PeerAddress::new("127.0.0.1", 4), "f", 9, 1, 30))
            .await;
        remote
            .insert(FileLocation::new(PeerAddress::new("127.0.0.1", 5), "f", 9, 5, 30))
            .await;

        PushConsistency::new()
            .on_invalidate(peer.context(), notice(1, &owner, 2))
            .await;

        // An unrelated file sharing the name is caught when its version is lower
        let replicas = remote.snapshot().await;
        assert!(!replicas[0].is_valid());
        assert!(replicas[1].is_valid());
    }

    #[tokio::test]
    async fn same_version_is_not_invalidated() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 1);
        let remote = peer.context().remote_files();
        remote.insert(FileLocation::new(owner.clone(), "f", 1, 2, 30)).await;

        PushConsistency::new()
            .on_invalidate(peer.context(), notice(1, &owner, 2))
            .await;
        assert!(remote.snapshot().await[0].is_valid());
    }

    #[tokio::test]
    async fn duplicate_notice_is_dropped() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 1);
        let strategy = PushConsistency::new();
        strategy.on_invalidate(peer.context(), notice(1, &owner, 2)).await;

        let remote = peer.context().remote_files();
        remote.insert(FileLocation::new(owner.clone(), "f", 1, 1, 30)).await;
        strategy.on_invalidate(peer.context(), notice(1, &owner, 2)).await;
        assert!(remote.snapshot().await[0].is_valid());

        strategy.on_invalidate(peer.context(), notice(2, &owner, 2)).await;
        assert!(!remote.snapshot().await[0].is_valid());
    }
}
