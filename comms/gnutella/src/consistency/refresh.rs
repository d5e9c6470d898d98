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

use log::*;

use crate::{
    file_location::FileLocation,
    node::NodeContext,
    transfer::{self, TransferError},
};

const LOG_TARGET: &str = "gnutella::consistency::refresh";

/// What happened to one invalid replica during a refresh
#[derive(Debug)]
pub struct RefreshOutcome {
    pub file_name: String,
    /// The freshly downloaded location, or why the replica was left in place
    pub result: Result<FileLocation, TransferError>,
}

/// Replaces every invalid replica with a fresh download. The owner is polled first; only when it answers with a
/// location is the stale copy deleted, its entry removed and the new copy downloaded. A replica whose owner cannot be
/// reached stays in the table (still invalid) so the next refresh retries it.
pub async fn refresh_files(context: &NodeContext) -> Vec<RefreshOutcome> {
    let invalid = context
        .remote_files
        .snapshot()
        .await
        .into_iter()
        .rev()
        .filter(|replica| !replica.is_valid())
        .collect::<Vec<_>>();
    debug!(
        target: LOG_TARGET,
        "[{}] Refreshing {} invalid replica(s)",
        context.address,
        invalid.len()
    );

    let mut outcomes = Vec::with_capacity(invalid.len());
    for replica in invalid {
        let result = refresh_replica(context, &replica).await;
        if let Err(err) = &result {
            warn!(
                target: LOG_TARGET,
                "[{}] Could not refresh '{}': {}",
                context.address,
                replica.name(),
                err
            );
        }
        outcomes.push(RefreshOutcome {
            file_name: replica.name().to_string(),
            result,
        });
    }
    outcomes
}

async fn refresh_replica(context: &NodeContext, replica: &FileLocation) -> Result<FileLocation, TransferError> {
    let owner = context.client_for(replica.owner()).await?;
    let fresh = owner
        .poll(replica.name().to_string())
        .await?
        .ok_or_else(|| TransferError::FileNotFound(replica.name().to_string()))?;

    transfer::remove_file(context.file_directory(), replica.name()).await?;
    context.remote_files.remove(replica).await;
    debug!(
        target: LOG_TARGET,
        "[{}] Stale replica {} removed, downloading {}", context.address, replica, fresh
    );
    context.download(&fresh).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::PeerConfig, net_address::PeerAddress, test_utils::TestNetwork};

    #[tokio::test]
    async fn unreachable_owner_keeps_invalid_entry() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        peer.write_file("f", b"stale");
        let mut replica = FileLocation::new(PeerAddress::new("127.0.0.1", 1), "f", 5, 1, 30);
        replica.invalidate();
        peer.context().remote_files().insert(replica).await;

        let outcomes = peer.refresh_files().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].file_name, "f");
        assert!(matches!(outcomes[0].result, Err(TransferError::Rpc(_))));

        let remote = peer.remote_files().await;
        assert_eq!(remote.len(), 1);
        assert!(!remote[0].is_valid());
        assert_eq!(peer.read_file("f"), b"stale");
    }

    #[tokio::test]
    async fn valid_replicas_are_left_alone() {
        let network = TestNetwork::new();
        let peer = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        peer.context()
            .remote_files()
            .insert(FileLocation::new(PeerAddress::new("127.0.0.1", 1), "f", 5, 1, 30))
            .await;
        assert!(peer.refresh_files().await.is_empty());
        assert_eq!(peer.remote_files().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_replica_is_redownloaded() {
        let network = TestNetwork::new();
        let holder = network.spawn_peer(PeerConfig::default_local_test(), &[]).await;
        let owner = network
            .spawn_peer(PeerConfig::default_local_test(), &[("f", "version 2")])
            .await;
        owner.touch("f").await.unwrap();
        holder.write_file("f", b"version 1");
        let mut replica = FileLocation::new(owner.address().clone(), "f", 9, 1, 30);
        replica.invalidate();
        holder.context().remote_files().insert(replica).await;

        let outcomes = holder.refresh_files().await;
        let fresh = outcomes[0].result.as_ref().unwrap();
        assert_eq!(fresh.version(), 2);
        assert_eq!(holder.read_file("f"), b"version 2");
        let remote = holder.remote_files().await;
        assert_eq!(remote.len(), 1);
        assert!(remote[0].is_valid());
        assert_eq!(remote[0].version(), 2);
    }
}
