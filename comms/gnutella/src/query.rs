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

//! Flooding search.
//!
//! A search floods a `query` through the overlay. Every peer records the neighbor it first saw the message from in
//! the ledger, drops later copies and forwards the query with one less hop of TTL to every other neighbor. A peer
//! that can resolve the file answers the neighbor it got the query from with a `hitquery`, which each peer on the way
//! back forwards to its own ledger entry for the message until it reaches the peer that minted the id.

use log::*;

use crate::{
    event::PeerEvent,
    ledger::MessageOrigin,
    message_id::MessageId,
    node::NodeContext,
    rpc::{HitQueryMessage, QueryMessage},
};

const LOG_TARGET: &str = "gnutella::query";

/// Floods a query for `file_name` to all neighbors and returns its id. Results arrive asynchronously in the search
/// result table of `context`.
pub async fn search(context: &NodeContext, file_name: &str) -> MessageId {
    let message_id = context.next_message_id();
    context
        .ledger
        .insert_if_absent(message_id.clone(), MessageOrigin::Local)
        .await;

    let message = QueryMessage {
        message_id: message_id.clone(),
        ttl: context.config.query_ttl,
        file_name: file_name.to_string(),
        sender: context.address.clone(),
    };
    let reached = context
        .neighbors
        .for_each_except(None, |client| {
            let message = message.clone();
            async move { client.query(message).await }
        })
        .await;
    debug!(
        target: LOG_TARGET,
        "[{}] Query {} for '{}' sent to {} neighbor(s)", context.address, message_id, file_name, reached
    );
    message_id
}

pub async fn handle_query(context: &NodeContext, message: QueryMessage) {
    let QueryMessage {
        message_id,
        ttl,
        file_name,
        sender,
    } = message;

    if ttl == 0 {
        debug!(target: LOG_TARGET, "Discarding query {} with exhausted TTL", message_id);
        return;
    }
    let new_ttl = ttl - 1;

    if !context
        .ledger
        .insert_if_absent(message_id.clone(), MessageOrigin::Neighbor(sender.clone()))
        .await
    {
        trace!(target: LOG_TARGET, "[{}] Duplicate query {} dropped", context.address, message_id);
        return;
    }

    if new_ttl > 0 {
        context.delay_propagation().await;
        let forward = QueryMessage {
            message_id: message_id.clone(),
            ttl: new_ttl,
            file_name: file_name.clone(),
            sender: context.address.clone(),
        };
        let reached = context
            .neighbors
            .for_each_except(Some(&sender), |client| {
                let forward = forward.clone();
                async move { client.query(forward).await }
            })
            .await;
        trace!(
            target: LOG_TARGET,
            "[{}] Query {} forwarded to {} neighbor(s) (ttl={})", context.address, message_id, reached, new_ttl
        );
    }

    let location = context.resolve_file(&file_name).await;
    context.publish_event(PeerEvent::QueryProcessed {
        message_id: message_id.clone(),
        found: location.is_some(),
    });

    let location = match location {
        Some(location) => location,
        None => return,
    };
    debug!(
        target: LOG_TARGET,
        "[{}] Hit for query {}: {}", context.address, message_id, location
    );
    let hit = HitQueryMessage {
        message_id,
        ttl: context.config.query_ttl,
        file_name,
        location,
    };
    let result = match context.client_for(&sender).await {
        Ok(client) => client.hit_query(hit).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        warn!(target: LOG_TARGET, "Failed to send hit to {}: {}", sender, err);
    }
}

pub async fn handle_hit_query(context: &NodeContext, message: HitQueryMessage) {
    let upstream = match context.ledger.origin_of(&message.message_id).await {
        Some(origin) => origin,
        None => {
            debug!(
                target: LOG_TARGET,
                "[{}] Hit for unknown query {} dropped", context.address, message.message_id
            );
            return;
        },
    };

    match upstream {
        MessageOrigin::Local => {
            let location = message.location;
            if context.search_results.insert_if_absent(location.clone()).await {
                info!(
                    target: LOG_TARGET,
                    "[{}] Search result for '{}': {}", context.address, message.file_name, location
                );
                context.publish_event(PeerEvent::SearchResultReceived(location));
            } else {
                trace!(target: LOG_TARGET, "Duplicate search result {} ignored", location);
            }
        },
        MessageOrigin::Neighbor(upstream) => {
            let new_ttl = message.ttl.saturating_sub(1);
            if new_ttl == 0 {
                debug!(
                    target: LOG_TARGET,
                    "[{}] Hit for {} dropped, TTL exhausted", context.address, message.message_id
                );
                return;
            }
            context.delay_propagation().await;
            let forward = HitQueryMessage { ttl: new_ttl, ..message };
            let result = match context.client_for(&upstream).await {
                Ok(client) => client.hit_query(forward).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                warn!(target: LOG_TARGET, "Failed to forward hit to {}: {}", upstream, err);
            }
        },
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::PeerConfig,
        event::PeerEventReceiver,
        file_location::FileLocation,
        net_address::PeerAddress,
        test_utils::TestNetwork,
    };

    fn drain_query_events(events: &mut PeerEventReceiver) -> Vec<bool> {
        let mut found = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let PeerEvent::QueryProcessed { found: f, .. } = &*event {
                found.push(*f);
            }
        }
        found
    }

    #[tokio::test]
    async fn search_finds_file_on_neighbor() {
        let _ = env_logger::try_init();
        let network = TestNetwork::new();
        let a = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let b = network
            .spawn_peer(PeerConfig::default_local_test(), &[("f.txt", "hello")])
            .await;
        network.connect(&a, &b).await;

        a.search("f.txt").await;
        async_assert_eventually!(a.search_results().await.len(), expect = 1);
        let hit = &a.search_results().await[0];
        assert_eq!(hit.owner(), b.address());
        assert_eq!(hit.size(), 5);
        assert!(b.search_results().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_query_is_processed_once() {
        let network = TestNetwork::new();
        let a = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let mut events = a.subscribe_events();

        let sender = PeerAddress::new("127.0.0.1", 1);
        let message = QueryMessage {
            message_id: MessageId::new(sender.clone(), 1, 1),
            ttl: 5,
            file_name: "missing".to_string(),
            sender,
        };
        handle_query(a.context(), message.clone()).await;
        handle_query(a.context(), message).await;
        assert_eq!(drain_query_events(&mut events), vec![false]);
    }

    #[tokio::test]
    async fn query_with_exhausted_ttl_is_ignored() {
        let network = TestNetwork::new();
        let a = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let mut events = a.subscribe_events();
        let sender = PeerAddress::new("127.0.0.1", 1);
        let message = QueryMessage {
            message_id: MessageId::new(sender.clone(), 1, 1),
            ttl: 0,
            file_name: "f".to_string(),
            sender,
        };
        handle_query(a.context(), message.clone()).await;
        assert!(drain_query_events(&mut events).is_empty());
        assert!(a.context().ledger().origin_of(&message.message_id).await.is_none());
    }

    #[tokio::test]
    async fn local_copy_is_preferred() {
        let network = TestNetwork::new();
        let a = network
            .spawn_peer(PeerConfig::default_local_test(), &[("f.txt", "local")])
            .await;
        let other = PeerAddress::new("127.0.0.1", 9);
        a.context()
            .remote_files()
            .insert(FileLocation::new(other, "f.txt", 100, 7, 30))
            .await;

        let resolved = a.context().resolve_file("f.txt").await.unwrap();
        assert_eq!(resolved.owner(), a.address());
        assert_eq!(resolved.version(), 1);
        assert_eq!(resolved.size(), 5);
    }

    #[tokio::test]
    async fn remote_copy_is_offered_as_own() {
        let network = TestNetwork::new();
        let mut config = PeerConfig::default_local_test();
        config.default_ttr = Duration::from_secs(12);
        let a = network.spawn_peer(config, &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 9);
        a.context()
            .remote_files()
            .insert(FileLocation::new(owner.clone(), "g", 100, 3, 30))
            .await;

        let resolved = a.context().resolve_file("g").await.unwrap();
        assert_eq!(resolved.owner(), a.address());
        assert_eq!(resolved.version(), 3);
        assert_eq!(resolved.ttr(), 12);

        // Invalid or expired copies are never offered
        a.context()
            .remote_files()
            .update_by_name("g", |l| l.invalidate())
            .await;
        assert!(a.context().resolve_file("g").await.is_none());

        a.context()
            .remote_files()
            .insert(FileLocation::new(owner, "h", 100, 1, 0))
            .await;
        assert!(a.context().resolve_file("h").await.is_none());
    }

    #[tokio::test]
    async fn hit_for_unknown_query_is_dropped() {
        let network = TestNetwork::new();
        let a = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = PeerAddress::new("127.0.0.1", 9);
        handle_hit_query(a.context(), HitQueryMessage {
            message_id: MessageId::new(owner.clone(), 1, 1),
            ttl: 10,
            file_name: "f".to_string(),
            location: FileLocation::new(owner, "f", 1, 1, 30),
        })
        .await;
        assert!(a.search_results().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_hits_are_listed_once() {
        let network = TestNetwork::new();
        let a = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let message_id = search(a.context(), "f").await;
        let owner = PeerAddress::new("127.0.0.1", 9);
        let hit = HitQueryMessage {
            message_id,
            ttl: 10,
            file_name: "f".to_string(),
            location: FileLocation::new(owner, "f", 1, 1, 30),
        };
        handle_hit_query(a.context(), hit.clone()).await;
        handle_hit_query(a.context(), hit).await;
        assert_eq!(a.search_results().await.len(), 1);
    }

    #[tokio::test]
    async fn relayed_hit_stops_when_ttl_runs_out() {
        let network = TestNetwork::new();
        let origin = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let relay = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        network.connect(&origin, &relay).await;

        let message_id = MessageId::new(origin.address().clone(), 1, 1);
        origin
            .context()
            .ledger()
            .insert_if_absent(message_id.clone(), MessageOrigin::Local)
            .await;
        relay
            .context()
            .ledger()
            .insert_if_absent(message_id.clone(), MessageOrigin::Neighbor(origin.address().clone()))
            .await;
        let owner = PeerAddress::new("127.0.0.1", 9);
        let hit = HitQueryMessage {
            message_id,
            ttl: 1,
            file_name: "f".to_string(),
            location: FileLocation::new(owner, "f", 1, 1, 30),
        };

        handle_hit_query(relay.context(), hit.clone()).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(origin.search_results().await.is_empty());

        // One more hop of budget and the same hit reaches the origin
        handle_hit_query(relay.context(), HitQueryMessage { ttl: 2, ..hit }).await;
        async_assert_eventually!(origin.search_results().await.len(), expect = 1);
        assert!(relay.search_results().await.is_empty());
    }
}
