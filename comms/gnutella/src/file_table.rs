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

use tokio::sync::RwLock;

use crate::file_location::FileLocation;

/// A table of file locations guarded by its own lock. Used for the local files, remote files and search results of
/// a peer. Locks are never held across network calls.
#[derive(Debug, Default)]
pub struct FileTable {
    entries: RwLock<Vec<FileLocation>>,
}

impl FileTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_entries(entries: Vec<FileLocation>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Inserts `location`, replacing an equal (same owner and name) entry. Returns true if no equal entry existed.
    pub async fn insert(&self, location: FileLocation) -> bool {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|l| **l == location) {
            Some(existing) => {
                *existing = location;
                false
            },
            None => {
                entries.push(location);
                true
            },
        }
    }

    /// Appends `location` unless an equal entry exists. Returns true if it was appended.
    pub async fn insert_if_absent(&self, location: FileLocation) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains(&location) {
            return false;
        }
        entries.push(location);
        true
    }

    pub async fn find_by_name(&self, name: &str) -> Option<FileLocation> {
        self.entries.read().await.iter().find(|l| l.name() == name).cloned()
    }

    pub async fn find<P>(&self, predicate: P) -> Option<FileLocation>
    where P: Fn(&FileLocation) -> bool {
        self.entries.read().await.iter().find(|l| predicate(l)).cloned()
    }

    pub async fn get(&self, index: usize) -> Option<FileLocation> {
        self.entries.read().await.get(index).cloned()
    }

    pub async fn contains(&self, location: &FileLocation) -> bool {
        self.entries.read().await.contains(location)
    }

    pub async fn snapshot(&self) -> Vec<FileLocation> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Applies `f` to the first entry called `name` and returns the updated entry
    pub async fn update_by_name<F>(&self, name: &str, f: F) -> Option<FileLocation>
    where F: FnOnce(&mut FileLocation) {
        let mut entries = self.entries.write().await;
        entries.iter_mut().find(|l| l.name() == name).map(|location| {
            f(location);
            location.clone()
        })
    }

    /// Applies `f` to the entry equal to `location` and returns the updated entry
    pub async fn update<F>(&self, location: &FileLocation, f: F) -> Option<FileLocation>
    where F: FnOnce(&mut FileLocation) {
        let mut entries = self.entries.write().await;
        entries.iter_mut().find(|l| *l == location).map(|entry| {
            f(entry);
            entry.clone()
        })
    }

    /// Applies `f` to every entry under a single write lock. Returns the entries for which `f` returned true.
    pub async fn update_all<F>(&self, mut f: F) -> Vec<FileLocation>
    where F: FnMut(&mut FileLocation) -> bool {
        let mut entries = self.entries.write().await;
        entries
            .iter_mut()
            .filter_map(|location| if f(location) { Some(location.clone()) } else { None })
            .collect()
    }

    pub async fn remove(&self, location: &FileLocation) -> Option<FileLocation> {
        let mut entries = self.entries.write().await;
        let pos = entries.iter().position(|l| l == location)?;
        Some(entries.remove(pos))
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net_address::PeerAddress;

    fn location(port: u16, name: &str, version: u32) -> FileLocation {
        FileLocation::new(PeerAddress::new("127.0.0.1", port), name, 10, version, 30)
    }

    #[tokio::test]
    async fn insert_replaces_equal_entry() {
        let table = FileTable::new();
        assert!(table.insert(location(1, "a", 1)).await);
        assert!(!table.insert(location(1, "a", 2)).await);
        assert!(table.insert(location(2, "a", 1)).await);
        assert_eq!(table.len().await, 2);
        assert_eq!(table.get(0).await.unwrap().version(), 2);
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first() {
        let table = FileTable::new();
        assert!(table.insert_if_absent(location(1, "a", 1)).await);
        assert!(!table.insert_if_absent(location(1, "a", 5)).await);
        assert_eq!(table.find_by_name("a").await.unwrap().version(), 1);
    }

    #[tokio::test]
    async fn update_and_remove() {
        let table = FileTable::with_entries(vec![location(1, "a", 1), location(1, "b", 1)]);
        let updated = table.update_by_name("b", |l| l.touch()).await.unwrap();
        assert_eq!(updated.version(), 2);
        assert!(table.update_by_name("c", |l| l.touch()).await.is_none());

        let invalidated = table.update(&location(1, "a", 0), |l| l.invalidate()).await.unwrap();
        assert!(!invalidated.is_valid());

        let removed = table.remove(&location(1, "a", 0)).await.unwrap();
        assert!(!removed.is_valid());
        assert!(table.remove(&location(1, "a", 0)).await.is_none());
        assert_eq!(table.snapshot().await, vec![location(1, "b", 2)]);
    }

    #[tokio::test]
    async fn update_all_reports_matches() {
        let table = FileTable::with_entries(vec![location(1, "a", 1), location(1, "b", 1)]);
        let expired = table
            .update_all(|l| {
                if l.name() == "a" {
                    l.tick_ttr(30);
                }
                l.is_expired()
            })
            .await;
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name(), "a");
    }
}
