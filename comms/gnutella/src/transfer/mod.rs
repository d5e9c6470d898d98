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

//! Bulk file transfer.
//!
//! `obtain` asks the holder of a file to open a one-shot listener and return its port. The downloader then connects to
//! `(holder host, port)` and copies the raw byte stream into a file of the same name. The listener serves exactly one
//! connection and gives up if nobody connects within the accept timeout.

mod error;
pub use error::TransferError;

use std::{path::Path, time::Duration};

use log::*;
use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task,
    time,
};

use crate::{file_location::FileLocation, rpc::PeerClient, storage};

const LOG_TARGET: &str = "gnutella::transfer";

/// Opens a one-shot listener on `bind_host` serving `file_name` from `directory` and returns the listening port
pub async fn serve_file(
    directory: &Path,
    file_name: &str,
    bind_host: &str,
    accept_timeout: Duration,
) -> Result<u16, TransferError> {
    let path =
        storage::file_path(directory, file_name).ok_or_else(|| TransferError::InvalidFileName(file_name.to_string()))?;
    let metadata = fs::metadata(&path)
        .await
        .map_err(|_| TransferError::FileNotFound(file_name.to_string()))?;
    if !metadata.is_file() {
        return Err(TransferError::FileNotFound(file_name.to_string()));
    }

    let listener = TcpListener::bind((bind_host, 0)).await?;
    let port = listener.local_addr()?.port();
    let file_name = file_name.to_string();
    debug!(target: LOG_TARGET, "Serving '{}' on port {}", file_name, port);

    task::spawn(async move {
        let socket = match time::timeout(accept_timeout, listener.accept()).await {
            Ok(Ok((socket, addr))) => {
                trace!(target: LOG_TARGET, "Transfer of '{}' to {} started", file_name, addr);
                socket
            },
            Ok(Err(err)) => {
                warn!(target: LOG_TARGET, "File transfer failed ({}): {}", file_name, err);
                return;
            },
            Err(_) => {
                warn!(
                    target: LOG_TARGET,
                    "File transfer timed out waiting for client connection ({})", file_name
                );
                return;
            },
        };
        match send_file(&path, socket).await {
            Ok(n) => debug!(target: LOG_TARGET, "Sent {} byte(s) of '{}'", n, file_name),
            Err(err) => warn!(target: LOG_TARGET, "File transfer failed ({}): {}", file_name, err),
        }
    });

    Ok(port)
}

async fn send_file(path: &Path, mut socket: TcpStream) -> Result<u64, TransferError> {
    let mut file = File::open(path).await?;
    let n = io::copy(&mut file, &mut socket).await?;
    socket.shutdown().await?;
    Ok(n)
}

/// Downloads the file described by `location` from `holder` into `directory`. Refuses before contacting the holder
/// if a file with the same name already exists. Returns the number of bytes received.
pub async fn download_file(
    holder: &PeerClient,
    location: &FileLocation,
    directory: &Path,
    connect_timeout: Duration,
) -> Result<u64, TransferError> {
    let file_name = location.name();
    let path =
        storage::file_path(directory, file_name).ok_or_else(|| TransferError::InvalidFileName(file_name.to_string()))?;
    if fs::metadata(&path).await.is_ok() {
        return Err(TransferError::FileExists(path));
    }

    let port = holder.obtain(file_name.to_string()).await?;
    let host = location.owner().host();
    let mut socket = time::timeout(connect_timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| TransferError::ConnectTimeout(format!("{}:{}", host, port)))??;

    let mut file = File::create(&path).await?;
    let result = async {
        let n = io::copy(&mut socket, &mut file).await?;
        file.flush().await?;
        Ok::<_, TransferError>(n)
    }
    .await;

    match result {
        Ok(n) => {
            if n != location.size() {
                debug!(
                    target: LOG_TARGET,
                    "Downloaded {} byte(s) of '{}', location advertised {}",
                    n,
                    file_name,
                    location.size()
                );
            }
            Ok(n)
        },
        Err(err) => {
            drop(file);
            if let Err(e) = fs::remove_file(&path).await {
                debug!(target: LOG_TARGET, "Could not remove partial download '{}': {}", path.display(), e);
            }
            Err(err)
        },
    }
}

/// Deletes the stored copy of `file_name` if there is one
pub async fn remove_file(directory: &Path, file_name: &str) -> Result<(), TransferError> {
    let path =
        storage::file_path(directory, file_name).ok_or_else(|| TransferError::InvalidFileName(file_name.to_string()))?;
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
