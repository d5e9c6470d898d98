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

use std::{ops::Deref, path::Path};

use tempfile::TempDir;

use crate::{
    config::PeerConfig,
    node::{PeerNode, PeerNodeBuilder},
    rpc::MemoryNetwork,
};

/// A peer on a [TestNetwork] sharing its own temporary directory
pub struct TestPeer {
    pub node: PeerNode,
    pub dir: TempDir,
}

impl TestPeer {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.path().join(name), contents).unwrap();
    }

    pub fn read_file(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.path().join(name)).unwrap()
    }
}

impl Deref for TestPeer {
    type Target = PeerNode;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

/// An in-memory overlay for tests
#[derive(Clone, Default)]
pub struct TestNetwork {
    network: MemoryNetwork,
}

impl TestNetwork {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn memory_network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Starts a peer whose shared directory initially holds `files`
    pub async fn spawn_peer(&self, mut config: PeerConfig, files: &[(&str, &str)]) -> TestPeer {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        config.file_directory = dir.path().to_path_buf();
        let node = PeerNodeBuilder::new(config)
            .with_memory_network(self.network.clone())
            .build()
            .await
            .unwrap();
        TestPeer { node, dir }
    }

    pub async fn connect(&self, a: &TestPeer, b: &TestPeer) {
        a.say_hello(b.address()).await.unwrap();
    }
}
