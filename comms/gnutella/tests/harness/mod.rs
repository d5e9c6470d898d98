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
    ops::Deref,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use gnutella_comms::{
    rpc::MemoryNetwork,
    ConsistencyMode,
    MessageId,
    PeerConfig,
    PeerEvent,
    PeerNode,
    PeerNodeBuilder,
};
use tempfile::TempDir;
use tokio::sync::broadcast::error::RecvError;

pub struct Peer {
    pub node: PeerNode,
    pub dir: TempDir,
    pub events: EventLog,
}

impl Peer {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, name: &str, contents: &str) {
        std::fs::write(self.path().join(name), contents).unwrap();
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).unwrap()
    }
}

impl Deref for Peer {
    type Target = PeerNode;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

/// Records every event published by a peer from the moment it is created
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Arc<PeerEvent>>>>,
}

impl EventLog {
    fn record(node: &PeerNode) -> Self {
        let log = EventLog::default();
        let mut receiver = node.subscribe_events();
        let events = log.events.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => events.lock().unwrap().push(event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
        log
    }

    pub fn count<P: Fn(&PeerEvent) -> bool>(&self, predicate: P) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn queries_processed(&self, message_id: &MessageId) -> usize {
        self.count(|e| matches!(e, PeerEvent::QueryProcessed { message_id: id, .. } if id == message_id))
    }
}

pub fn config(mode: ConsistencyMode) -> PeerConfig {
    let mut config = PeerConfig::default_local_test();
    config.consistency_mode = mode;
    config
}

pub async fn spawn(network: &MemoryNetwork, config: PeerConfig, files: &[(&str, &str)]) -> Peer {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    let mut config = config;
    config.file_directory = dir.path().to_path_buf();
    let node = PeerNodeBuilder::new(config)
        .with_memory_network(network.clone())
        .build()
        .await
        .unwrap();
    let events = EventLog::record(&node);
    Peer { node, dir, events }
}

pub async fn link(a: &Peer, b: &Peer) {
    a.say_hello(b.address()).await.unwrap();
}

/// Starts `n` peers linked in a line: 0 - 1 - ... - (n-1)
pub async fn chain(network: &MemoryNetwork, configs: Vec<(PeerConfig, Vec<(&str, &str)>)>) -> Vec<Peer> {
    let mut peers = Vec::with_capacity(configs.len());
    for (config, files) in configs {
        peers.push(spawn(network, config, &files).await);
    }
    for pair in peers.windows(2) {
        link(&pair[0], &pair[1]).await;
    }
    peers
}

/// Lets in-flight floods settle before asserting that something did not happen
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}
