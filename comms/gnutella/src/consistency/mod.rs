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

//! Replica consistency.
//!
//! A peer runs exactly one [ConsistencyStrategy], chosen from its configured [ConsistencyMode] when the node is built.
//! In push mode the owner of a file floods an `invalidate` notice when it updates the file. In pull mode replica
//! holders let their TTR decay on a fixed tick and poll the owner when a replica is about to go stale.
//!
//! Either way an invalid replica stays in the remote table until [refresh_files] replaces it with a fresh download.

mod pull;
pub use pull::PullConsistency;

mod push;
pub use push::PushConsistency;

mod refresh;
pub use refresh::{refresh_files, RefreshOutcome};

mod task;
pub use task::ConsistencyTask;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    config::{ConsistencyMode, PeerConfig},
    file_location::FileLocation,
    node::NodeContext,
    rpc::InvalidateMessage,
};

#[async_trait]
pub trait ConsistencyStrategy: Send + Sync {
    fn mode(&self) -> ConsistencyMode;

    /// Called after the owner bumped the version of one of its local files
    async fn on_local_update(&self, context: &NodeContext, location: &FileLocation);

    /// Called for every `invalidate` received from a neighbor
    async fn on_invalidate(&self, context: &NodeContext, message: InvalidateMessage);

    /// The period of [ConsistencyStrategy::on_tick], or None if the strategy has no periodic work
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    async fn on_tick(&self, _context: &NodeContext) {}
}

/// Returns the strategy for the mode selected in `config`
pub fn strategy_for(config: &PeerConfig) -> Arc<dyn ConsistencyStrategy> {
    match config.consistency_mode {
        ConsistencyMode::Push => Arc::new(PushConsistency::new()),
        ConsistencyMode::Pull => Arc::new(PullConsistency::new(config.pull)),
    }
}
