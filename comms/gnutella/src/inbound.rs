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

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use log::*;
use tokio::sync::mpsc;

use crate::{
    bounded_executor::BoundedExecutor,
    rpc::{HitQueryMessage, InvalidateMessage, QueryMessage},
    shutdown::ShutdownSignal,
};

const LOG_TARGET: &str = "gnutella::inbound";

/// Fire-and-forget messages queued for asynchronous processing. The sending peer is acknowledged as soon as the
/// message is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Query(QueryMessage),
    HitQuery(HitQueryMessage),
    Invalidate(InvalidateMessage),
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundMessage::Query(msg) => write!(f, "Query({})", msg.message_id),
            InboundMessage::HitQuery(msg) => write!(f, "HitQuery({})", msg.message_id),
            InboundMessage::Invalidate(msg) => write!(f, "Invalidate({})", msg.message_id),
        }
    }
}

#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    async fn handle(&self, message: InboundMessage);
}

/// Calls an [InboundHandler] with every message received on a channel, each on its own task. At most as many
/// handlers as the executor has permits run at once; the pipeline stops pulling from the channel while none are free.
pub struct Inbound<H> {
    executor: BoundedExecutor,
    handler: Arc<H>,
    stream: mpsc::Receiver<InboundMessage>,
    shutdown_signal: ShutdownSignal,
}

impl<H: InboundHandler> Inbound<H> {
    pub fn new(
        executor: BoundedExecutor,
        stream: mpsc::Receiver<InboundMessage>,
        handler: Arc<H>,
        shutdown_signal: ShutdownSignal,
    ) -> Self {
        Self {
            executor,
            handler,
            stream,
            shutdown_signal,
        }
    }

    pub async fn run(mut self) {
        let mut shutdown_signal = self.shutdown_signal.clone();
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown_signal.wait() => {
                    info!(
                        target: LOG_TARGET,
                        "Inbound pipeline is terminating because the shutdown signal is triggered"
                    );
                    break;
                },
                message = self.stream.recv() => match message {
                    Some(message) => message,
                    None => {
                        debug!(target: LOG_TARGET, "Inbound message stream closed");
                        break;
                    },
                },
            };

            trace!(target: LOG_TARGET, "Dispatching {}", message);
            let handler = self.handler.clone();
            if self
                .executor
                .spawn(async move { handler.handle(message).await })
                .await
                .is_none()
            {
                warn!(target: LOG_TARGET, "Inbound executor closed, dropping remaining messages");
                break;
            }
        }
        self.stream.close();
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::{message_id::MessageId, net_address::PeerAddress, shutdown::Shutdown};

    struct ForwardingHandler {
        tx: mpsc::UnboundedSender<InboundMessage>,
    }

    #[async_trait]
    impl InboundHandler for ForwardingHandler {
        async fn handle(&self, message: InboundMessage) {
            self.tx.send(message).unwrap();
        }
    }

    fn query(seq: u64) -> InboundMessage {
        let sender = PeerAddress::new("127.0.0.1", 1);
        InboundMessage::Query(QueryMessage {
            message_id: MessageId::new(sender.clone(), 1, seq),
            ttl: 3,
            file_name: "f".to_string(),
            sender,
        })
    }

    #[tokio::test]
    async fn run() {
        let (in_tx, in_rx) = mpsc::channel(10);
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let shutdown = Shutdown::new();
        let pipeline = Inbound::new(
            BoundedExecutor::new(1),
            in_rx,
            Arc::new(ForwardingHandler { tx: out_tx }),
            shutdown.to_signal(),
        );
        let task = tokio::spawn(pipeline.run());

        for seq in 0..6 {
            in_tx.send(query(seq)).await.unwrap();
        }
        let mut received = Vec::new();
        for _ in 0..6 {
            let msg = time::timeout(Duration::from_secs(5), out_rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(msg);
        }
        assert!((0..6).all(|seq| received.contains(&query(seq))));

        // The pipeline ends when the stream closes
        drop(in_tx);
        time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (in_tx, in_rx) = mpsc::channel(10);
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let mut shutdown = Shutdown::new();
        let pipeline = Inbound::new(
            BoundedExecutor::new(1),
            in_rx,
            Arc::new(ForwardingHandler { tx: out_tx }),
            shutdown.to_signal(),
        );
        let task = tokio::spawn(pipeline.run());
        shutdown.trigger();
        time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(in_tx.send(query(1)).await.is_err());
    }
}
