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

mod harness;

use std::time::Duration;

use gnutella_comms::{
    async_assert_eventually,
    rpc::{Connector, InvalidateMessage, MemoryNetwork},
    ConsistencyMode,
    FileLocation,
    PeerConfig,
    PeerNodeBuilder,
};
use harness::{chain, config, link, settle, spawn};

#[tokio::test]
async fn query_is_processed_once_per_peer_on_a_cycle() {
    let _ = env_logger::try_init();
    let network = MemoryNetwork::new();
    let mut peers = Vec::new();
    for _ in 0..4 {
        peers.push(spawn(&network, config(ConsistencyMode::Push), &[]).await);
    }
    // Ring 0-1-2-3-0 with a chord 0-2
    link(&peers[0], &peers[1]).await;
    link(&peers[1], &peers[2]).await;
    link(&peers[2], &peers[3]).await;
    link(&peers[3], &peers[0]).await;
    link(&peers[0], &peers[2]).await;

    let message_id = peers[0].search("missing").await;
    for peer in &peers[1..] {
        async_assert_eventually!(peer.events.queries_processed(&message_id), expect = 1);
    }
    settle().await;
    for peer in &peers[1..] {
        assert_eq!(peer.events.queries_processed(&message_id), 1);
    }
    // The origin drops its own query when it comes back around
    assert_eq!(peers[0].events.queries_processed(&message_id), 0);
}

#[tokio::test]
async fn query_does_not_travel_beyond_its_ttl() {
    let network = MemoryNetwork::new();
    let mut origin_config = config(ConsistencyMode::Push);
    origin_config.query_ttl = 2;
    let peers = chain(&network, vec![
        (origin_config, vec![]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![("f", "far away")]),
        (config(ConsistencyMode::Push), vec![]),
    ])
    .await;

    let message_id = peers[0].search("f").await;
    async_assert_eventually!(peers[2].events.queries_processed(&message_id), expect = 1);
    settle().await;
    assert_eq!(peers[1].events.queries_processed(&message_id), 1);
    assert_eq!(peers[3].events.queries_processed(&message_id), 0);
    assert_eq!(peers[4].events.queries_processed(&message_id), 0);
    assert!(peers[0].search_results().await.is_empty());
}

#[tokio::test]
async fn hits_reach_only_the_origin() {
    let network = MemoryNetwork::new();
    let peers = chain(&network, vec![
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![("f", "data")]),
    ])
    .await;

    peers[0].search("f").await;
    async_assert_eventually!(peers[0].search_results().await.len(), expect = 1);
    settle().await;
    let results = peers[0].search_results().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].owner(), peers[2].address());
    assert_eq!(results[0].version(), 1);
    assert!(peers[1].search_results().await.is_empty());
    assert!(peers[2].search_results().await.is_empty());
}

#[tokio::test]
async fn diamond_query_yields_exactly_one_hit() {
    let network = MemoryNetwork::new();
    let a = spawn(&network, config(ConsistencyMode::Push), &[]).await;
    let b = spawn(&network, config(ConsistencyMode::Push), &[]).await;
    let c = spawn(&network, config(ConsistencyMode::Push), &[]).await;
    let d = spawn(&network, config(ConsistencyMode::Push), &[("f", "diamond")]).await;
    link(&a, &b).await;
    link(&a, &c).await;
    link(&b, &d).await;
    link(&c, &d).await;

    let message_id = a.search("f").await;
    async_assert_eventually!(a.search_results().await.len(), expect = 1);
    settle().await;
    assert_eq!(a.search_results().await.len(), 1);
    assert_eq!(a.search_results().await[0].owner(), d.address());
    assert_eq!(d.events.queries_processed(&message_id), 1);
}

#[tokio::test]
async fn replica_holder_can_answer_queries() {
    let network = MemoryNetwork::new();
    let peers = chain(&network, vec![
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![("f", "payload")]),
    ])
    .await;

    // 1 obtains a copy from 2 and then answers for it, pointing at itself
    peers[1].search("f").await;
    async_assert_eventually!(peers[1].search_results().await.len(), expect = 1);
    let hit = peers[1].search_results().await[0].clone();
    peers[1].download(&hit).await.unwrap();

    peers[0].search("f").await;
    async_assert_eventually!(peers[0].search_results().await.len(), expect = 2);
    let owners = peers[0]
        .search_results()
        .await
        .iter()
        .map(|l| l.owner().clone())
        .collect::<Vec<_>>();
    assert!(owners.contains(peers[1].address()));
    assert!(owners.contains(peers[2].address()));
}

#[tokio::test]
async fn polled_versions_never_decrease() {
    let network = MemoryNetwork::new();
    let owner = spawn(&network, config(ConsistencyMode::Pull), &[("f", "v")]).await;
    let client = network.connector().connect(owner.address()).await.unwrap();

    let mut last = 0;
    for i in 0..10 {
        if i % 3 == 0 {
            owner.touch("f").await.unwrap();
        }
        let version = client.poll("f".to_string()).await.unwrap().unwrap().version();
        assert!(version >= last);
        last = version;
    }
    assert_eq!(last, 5);
}

#[tokio::test]
async fn pull_mode_ignores_invalidations() {
    let network = MemoryNetwork::new();
    let owner = spawn(&network, config(ConsistencyMode::Push), &[("f", "v1")]).await;
    let holder = spawn(&network, config(ConsistencyMode::Pull), &[]).await;
    let location = holder.context().resolve_file("f").await;
    assert!(location.is_none());

    holder
        .download(&owner.context().resolve_file("f").await.unwrap())
        .await
        .unwrap();
    let updated = owner.touch("f").await.unwrap();

    let client = network.connector().connect(holder.address()).await.unwrap();
    client
        .invalidate(InvalidateMessage {
            message_id: owner.context().next_message_id(),
            ttl: 10,
            file_name: "f".to_string(),
            location: updated,
            sender: owner.address().clone(),
        })
        .await
        .unwrap();
    settle().await;
    assert!(holder.remote_files().await[0].is_valid());
}

#[tokio::test]
async fn push_invalidation_crosses_a_three_peer_chain() {
    let network = MemoryNetwork::new();
    let peers = chain(&network, vec![
        (config(ConsistencyMode::Push), vec![("f", "version 1")]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
    ])
    .await;
    let (a, c) = (&peers[0], &peers[2]);

    c.search("f").await;
    async_assert_eventually!(c.search_results().await.len(), expect = 1);
    let hit = c.search_results().await[0].clone();
    assert_eq!(hit.owner(), a.address());
    c.download(&hit).await.unwrap();
    assert_eq!(c.read_file("f"), "version 1");
    assert!(c.remote_files().await[0].is_valid());

    a.write_file("f", "version 2");
    let updated = a.touch("f").await.unwrap();
    assert_eq!(updated.version(), 2);

    async_assert_eventually!(c.remote_files().await[0].is_valid(), expect = false);
    assert_eq!(c.remote_files().await[0].version(), 1);

    // Refresh replaces the invalid copy with the new version
    let outcomes = c.refresh_files().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].result.is_ok());
    assert_eq!(c.read_file("f"), "version 2");
    let remote = c.remote_files().await;
    assert_eq!(remote.len(), 1);
    assert!(remote[0].is_valid());
    assert_eq!(remote[0].version(), 2);
}

#[tokio::test]
async fn push_invalidation_stops_after_query_ttl_hops() {
    let network = MemoryNetwork::new();
    let mut owner_config = config(ConsistencyMode::Push);
    owner_config.query_ttl = 2;
    let peers = chain(&network, vec![
        (owner_config, vec![("f", "version 1")]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
        (config(ConsistencyMode::Push), vec![]),
    ])
    .await;
    let owner = &peers[0];
    let original = owner.local_files().await[0].clone();
    for holder in &peers[1..] {
        holder.download(&original).await.unwrap();
        assert!(holder.remote_files().await[0].is_valid());
    }

    owner.write_file("f", "version 2");
    owner.touch("f").await.unwrap();

    async_assert_eventually!(peers[1].remote_files().await[0].is_valid(), expect = false);
    async_assert_eventually!(peers[2].remote_files().await[0].is_valid(), expect = false);
    settle().await;
    // Three hops away is beyond a budget of two
    let far = peers[3].remote_files().await;
    assert!(far[0].is_valid());
    assert_eq!(far[0].version(), 1);
}

#[tokio::test]
async fn pull_mode_detects_stale_replica_and_refreshes() {
    let network = MemoryNetwork::new();
    let mut owner_config = config(ConsistencyMode::Pull);
    owner_config.default_ttr = Duration::from_secs(3);
    let owner = spawn(&network, owner_config, &[("f", "version 1")]).await;
    let holder = spawn(&network, config(ConsistencyMode::Pull), &[]).await;
    link(&holder, &owner).await;

    holder.search("f").await;
    async_assert_eventually!(holder.search_results().await.len(), expect = 1);
    let hit = holder.search_results().await[0].clone();
    assert_eq!(hit.ttr(), 3);
    holder.download(&hit).await.unwrap();

    owner.write_file("f", "version 2");
    owner.touch("f").await.unwrap();

    // The replica is polled once its TTR reaches the threshold and found to be stale
    async_assert_eventually!(
        holder.remote_files().await[0].is_valid(),
        expect = false,
        max_attempts = 50,
        interval = Duration::from_millis(200),
    );
    assert_eq!(holder.read_file("f"), "version 1");

    let outcomes = holder.refresh_files().await;
    assert!(outcomes[0].result.is_ok());
    assert_eq!(holder.read_file("f"), "version 2");
    assert_eq!(holder.remote_files().await[0].version(), 2);
}

#[tokio::test]
async fn pull_mode_keeps_fresh_replicas_valid() {
    let network = MemoryNetwork::new();
    let mut owner_config = config(ConsistencyMode::Pull);
    owner_config.default_ttr = Duration::from_secs(2);
    let owner = spawn(&network, owner_config, &[("f", "stable")]).await;
    let holder = spawn(&network, config(ConsistencyMode::Pull), &[]).await;

    let location = owner.context().resolve_file("f").await.unwrap();
    holder.download(&location).await.unwrap();

    // Several poll cycles pass without an update
    tokio::time::sleep(Duration::from_secs(4)).await;
    let replica = &holder.remote_files().await[0];
    assert!(replica.is_valid());
    assert!(holder.events.count(|e| matches!(e, gnutella_comms::PeerEvent::ReplicaRenewed(_))) >= 1);
}

#[tokio::test]
async fn download_refuses_to_overwrite() {
    let network = MemoryNetwork::new();
    let owner = spawn(&network, config(ConsistencyMode::Push), &[("f", "remote")]).await;
    let holder = spawn(&network, config(ConsistencyMode::Push), &[("f", "local")]).await;
    let location: FileLocation = owner.context().resolve_file("f").await.unwrap();
    assert!(holder.download(&location).await.is_err());
    assert_eq!(holder.read_file("f"), "local");
    assert!(holder.remote_files().await.is_empty());
}

#[tokio::test]
async fn peers_work_over_tcp() {
    let _ = env_logger::try_init();
    let owner_dir = tempfile::tempdir().unwrap();
    std::fs::write(owner_dir.path().join("f.bin"), vec![3u8; 100_000]).unwrap();
    let holder_dir = tempfile::tempdir().unwrap();

    let mut owner_config = PeerConfig::default_local_test();
    owner_config.file_directory = owner_dir.path().to_path_buf();
    let mut owner = PeerNodeBuilder::new(owner_config).build().await.unwrap();

    let mut holder_config = PeerConfig::default_local_test();
    holder_config.file_directory = holder_dir.path().to_path_buf();
    let mut holder = PeerNodeBuilder::new(holder_config).build().await.unwrap();

    holder.say_hello(owner.address()).await.unwrap();
    assert_eq!(owner.neighbors().await, vec![holder.address().clone()]);

    holder.search("f.bin").await;
    async_assert_eventually!(holder.search_results().await.len(), expect = 1);
    let hit = holder.search_results().await[0].clone();
    holder.download(&hit).await.unwrap();
    assert_eq!(
        std::fs::read(holder_dir.path().join("f.bin")).unwrap(),
        vec![3u8; 100_000]
    );

    holder.shutdown().await;
    owner.shutdown().await;
}
