// Copyright 2025 bgpgg Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::session::SessionState;
use crate::config::PeerConfig;
use crate::error::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;
use tokio::sync::oneshot;

/// One configured peer and its session. Keeping both in a single entry
/// means neither can exist without the other.
#[derive(Debug)]
pub struct PeerEntry {
    pub config: PeerConfig,
    pub session: SessionState,
    /// Identifies the incarnation of this address. A progression task only
    /// writes while the generation it was started with is still current.
    pub generation: u64,
    /// Dropped on removal, which wakes the progression task so it exits.
    cancel: Option<oneshot::Sender<()>>,
}

impl PeerEntry {
    pub fn new(
        config: PeerConfig,
        session: SessionState,
        generation: u64,
        cancel: oneshot::Sender<()>,
    ) -> Self {
        PeerEntry {
            config,
            session,
            generation,
            cancel: Some(cancel),
        }
    }

    /// Tell the progression task to stop. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// Peers keyed by address. Not synchronised; the owner serialises access.
#[derive(Debug, Default)]
pub struct PeerStore {
    peers: HashMap<String, PeerEntry>,
}

impl PeerStore {
    pub fn new() -> Self {
        PeerStore::default()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&PeerEntry> {
        self.peers.get(address)
    }

    /// Insert a new entry. The existing entry is left untouched on conflict.
    pub fn insert(&mut self, entry: PeerEntry) -> Result<(), EngineError> {
        let address = entry.config.address.clone();
        if self.peers.contains_key(&address) {
            return Err(EngineError::DuplicatePeer(address));
        }
        self.peers.insert(address, entry);
        Ok(())
    }

    /// Remove an entry and cancel its progression task.
    pub fn remove(&mut self, address: &str) -> Result<PeerEntry, EngineError> {
        let mut entry = self
            .peers
            .remove(address)
            .ok_or_else(|| EngineError::PeerNotFound(address.to_string()))?;
        entry.cancel();
        Ok(entry)
    }

    /// Replace every non-identity field of a peer's configuration. The
    /// session is not touched.
    pub fn update_config(&mut self, config: PeerConfig, now: SystemTime) -> Result<(), EngineError> {
        let entry = self
            .peers
            .get_mut(&config.address)
            .ok_or_else(|| EngineError::PeerNotFound(config.address.clone()))?;

        let created_at = entry.config.created_at;
        entry.config = PeerConfig {
            created_at,
            updated_at: Some(now),
            ..config
        };
        Ok(())
    }

    /// Entry for `address` if it still belongs to `generation`.
    pub fn current_mut(&mut self, address: &str, generation: u64) -> Option<&mut PeerEntry> {
        self.peers
            .get_mut(address)
            .filter(|entry| entry.generation == generation)
    }

    /// Copies of every session, ordered by address.
    pub fn sessions(&self) -> Vec<SessionState> {
        let mut sessions: Vec<SessionState> =
            self.peers.values().map(|e| e.session.clone()).collect();
        sessions.sort_by(|a, b| a.address.cmp(&b.address));
        sessions
    }

    /// Copies of every peer configuration, ordered by address.
    pub fn peers(&self) -> Vec<PeerConfig> {
        let mut peers: Vec<PeerConfig> = self.peers.values().map(|e| e.config.clone()).collect();
        peers.sort_by(|a, b| a.address.cmp(&b.address));
        peers
    }

    /// Cancel every progression task without removing any entry.
    pub fn cancel_all(&mut self) {
        for entry in self.peers.values_mut() {
            entry.cancel();
        }
    }

    /// Iterate over entries in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &PeerEntry> {
        self.peers.values()
    }
}

/// Handle to the store shared between the coordinator and progression
/// tasks. Every reader and writer goes through this one lock.
#[derive(Debug, Default, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<PeerStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        SharedStore::default()
    }

    // Entries are replaced or advanced in a single call, so a poisoned
    // lock still guards consistent data.
    pub fn read(&self) -> RwLockReadGuard<'_, PeerStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, PeerStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
