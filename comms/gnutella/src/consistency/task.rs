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

use std::sync::Arc;

use log::*;
use tokio::time::{self, Instant};

use crate::{node::NodeContext, shutdown::ShutdownSignal};

const LOG_TARGET: &str = "gnutella::consistency::task";

/// Drives [ConsistencyStrategy::on_tick](super::ConsistencyStrategy::on_tick) at the strategy's interval until
/// shutdown. The time spent in a tick is subtracted from the following sleep so ticks do not drift.
pub struct ConsistencyTask {
    context: Arc<NodeContext>,
    shutdown_signal: ShutdownSignal,
}

impl ConsistencyTask {
    pub fn new(context: Arc<NodeContext>, shutdown_signal: ShutdownSignal) -> Self {
        Self {
            context,
            shutdown_signal,
        }
    }

    pub async fn run(mut self) {
        let interval = match self.context.consistency().tick_interval() {
            Some(interval) => interval,
            None => {
                debug!(
                    target: LOG_TARGET,
                    "{} consistency has no periodic work",
                    self.context.consistency().mode()
                );
                return;
            },
        };
        info!(
            target: LOG_TARGET,
            "[{}] Consistency task started (interval = {:.2?})",
            self.context.address(),
            interval
        );

        let mut remaining = interval;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_signal.wait() => break,
                _ = time::sleep(remaining) => {},
            }

            let started = Instant::now();
            self.context.consistency().on_tick(&self.context).await;
            let elapsed = started.elapsed();
            if elapsed > interval {
                warn!(
                    target: LOG_TARGET,
                    "Consistency tick took {:.2?}, longer than the {:.2?} interval", elapsed, interval
                );
            }
            remaining = interval.saturating_sub(elapsed);
        }

        info!(target: LOG_TARGET, "[{}] Consistency task stopped", self.context.address());
    }
}
