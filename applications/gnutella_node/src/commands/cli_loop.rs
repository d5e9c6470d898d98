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

use clap::Parser;
use gnutella_comms::PeerEvent;
use log::*;
use rustyline::error::ReadlineError;
use tokio::{signal, sync::broadcast::error::RecvError, task};

use super::{reader::CommandReader, Args, Command, CommandContext, HandleCommand};

const LOG_TARGET: &str = "gnutella::node::cli";

pub struct CliLoop {
    context: CommandContext,
    non_interactive: bool,
}

impl CliLoop {
    pub fn new(context: CommandContext, non_interactive: bool) -> Self {
        Self {
            context,
            non_interactive,
        }
    }

    /// Runs until the operator quits or Ctrl-C is pressed, then hands the context back so the node can be shut down
    pub async fn cli_loop(self) -> CommandContext {
        if self.non_interactive {
            self.watch_for_interrupt().await
        } else {
            self.interactive().await
        }
    }

    async fn watch_for_interrupt(self) -> CommandContext {
        if let Err(err) = signal::ctrl_c().await {
            error!(target: LOG_TARGET, "Could not listen for Ctrl-C: {}", err);
        }
        info!(target: LOG_TARGET, "Termination signal received. Shutting node down.");
        self.context
    }

    async fn interactive(mut self) -> CommandContext {
        spawn_event_printer(&self.context);
        let mut reader = CommandReader::new();
        println!("Enter 'help' for a list of commands");
        loop {
            tokio::select! {
                biased;
                _ = signal::ctrl_c() => {
                    println!("CTRL-C received");
                    break;
                },
                line = reader.next_command() => {
                    match line {
                        Some(Ok(line)) => {
                            if self.handle_line(&line).await {
                                break;
                            }
                        },
                        Some(Err(ReadlineError::Interrupted)) | Some(Err(ReadlineError::Eof)) => {
                            println!("CTRL-C received");
                            break;
                        },
                        Some(Err(err)) => {
                            println!("Error: {:?}", err);
                            break;
                        },
                        None => break,
                    }
                },
            }
        }
        println!("Shutting down");
        info!(
            target: LOG_TARGET,
            "Termination signal received from user. Shutting node down."
        );
        self.context
    }

    /// Parses and runs one console line. Returns true if the operator asked to quit.
    async fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let command = match Args::try_parse_from(line.split_whitespace()) {
            Ok(args) => args.command,
            Err(err) => {
                let _ = err.print();
                return false;
            },
        };
        if let Command::Quit = command {
            return true;
        }
        debug!(target: LOG_TARGET, "Running command: {}", line.trim());
        if let Err(err) = self.context.handle_command(command).await {
            println!("Command Error: {}", err);
        }
        false
    }
}

/// Prints protocol events an operator cares about as they happen
fn spawn_event_printer(context: &CommandContext) {
    let mut events = context.node().subscribe_events();
    task::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match &*event {
                    PeerEvent::SearchResultReceived(location) => println!("📄 Found {}", location),
                    PeerEvent::NeighborAdded(address) => println!("🤝 {} is a neighbor", address),
                    PeerEvent::ReplicaInvalidated(location) => println!("⚠️  Replica is out of date: {}", location),
                    PeerEvent::ReplicaExpired(location) => println!("⌛ Replica TTR expired: {}", location),
                    _ => {},
                },
                Err(RecvError::Lagged(n)) => {
                    warn!(target: LOG_TARGET, "Console missed {} events", n);
                },
                Err(RecvError::Closed) => break,
            }
        }
    });
}
