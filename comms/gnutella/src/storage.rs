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

//! The shared directory of a peer. Every regular, non-hidden file in it is offered to the overlay as a local file.

use std::{
    io,
    path::{Path, PathBuf},
};

use log::*;
use tokio::fs;

use crate::{file_location::FileLocation, net_address::PeerAddress};

const LOG_TARGET: &str = "gnutella::storage";

/// Returns true if `name` refers to a file directly inside the shared directory
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() &&
        name != "." &&
        name != ".." &&
        !name.contains('/') &&
        !name.contains('\\') &&
        !name.contains('\0')
}

/// Returns the path of `name` inside `directory`, or None if `name` would escape the directory
pub fn file_path(directory: &Path, name: &str) -> Option<PathBuf> {
    if is_valid_file_name(name) {
        Some(directory.join(name))
    } else {
        None
    }
}

/// Scans `directory` and returns a version-1 local location for every shared file, sorted by name. The directory is
/// created if it does not exist.
pub async fn load_local_files(directory: &Path, owner: &PeerAddress, ttr: i64) -> io::Result<Vec<FileLocation>> {
    fs::create_dir_all(directory).await?;
    let mut entries = fs::read_dir(directory).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                debug!(target: LOG_TARGET, "Skipping non UTF-8 file name {:?}", name);
                continue;
            },
        };
        if name.starts_with('.') {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        files.push(FileLocation::new_local(owner.clone(), name, metadata.len(), ttr));
    }
    files.sort_by(|a, b| a.name().cmp(b.name()));
    info!(
        target: LOG_TARGET,
        "Loaded {} local file(s) from '{}'",
        files.len(),
        directory.display()
    );
    Ok(files)
}
