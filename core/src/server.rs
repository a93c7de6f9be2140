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

use crate::config::{EngineConfig, PeerConfig};
use crate::engine::SessionEngine;
use crate::error::EngineError;
use crate::fault::FaultInjector;
use crate::log::{debug, info};
use crate::peer::{run_session_progression, BgpState, PeerEntry, SessionState, SharedStore};
use crate::running_config::render_running_config;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Counters behind the upstream stats/health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub peers: usize,
    pub established: usize,
    pub by_state: HashMap<BgpState, usize>,
    pub fault_injection: bool,
}

impl EngineStats {
    pub fn count(&self, state: BgpState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }
}

/// In-memory session engine: owns the peer store, starts one progression
/// task per added peer, and serialises every access through the store lock.
///
/// Each instance is independent. Share one between callers with an `Arc`.
pub struct Coordinator {
    store: SharedStore,
    faults: FaultInjector,
    transition_delay: Duration,
    next_generation: AtomicU64,
    runtime: Handle,
}

impl Coordinator {
    /// Create an engine whose progression tasks run on the current Tokio
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime. Use
    /// [`Coordinator::with_runtime`] to supply one explicitly.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    pub fn with_runtime(config: EngineConfig, runtime: Handle) -> Self {
        info!(
            transition_delay_ms = config.transition_delay.as_millis() as u64,
            fault_injection = config.fault_injection,
            "session engine created"
        );
        Coordinator {
            store: SharedStore::new(),
            faults: FaultInjector::new(config.fault_injection),
            transition_delay: config.transition_delay,
            next_generation: AtomicU64::new(1),
            runtime,
        }
    }

    pub fn transition_delay(&self) -> Duration {
        self.transition_delay
    }

    pub fn fault_injection_enabled(&self) -> bool {
        self.faults.is_enabled()
    }

    pub fn set_fault_injection(&self, enabled: bool) {
        info!(enabled, "fault injection toggled");
        self.faults.set_enabled(enabled);
    }

    pub fn add_peer(&self, config: PeerConfig) -> Result<(), EngineError> {
        self.faults.check("add_peer")?;
        if let Err(e) = config.validate() {
            debug!(peer_addr = %config.address, error = %e, "rejected add peer");
            return Err(e);
        }

        let now = SystemTime::now();
        let address = config.address.clone();
        let config = PeerConfig {
            created_at: Some(now),
            updated_at: Some(now),
            ..config
        };
        let session = SessionState::new(&address, now);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        {
            let mut store = self.store.write();
            if let Err(e) = store.insert(PeerEntry::new(config, session, generation, cancel_tx)) {
                debug!(peer_addr = %address, "rejected duplicate peer");
                return Err(e);
            }
            info!(peer_ip = %address, generation, total_peers = store.len(), "peer added");
        }

        self.runtime.spawn(run_session_progression(
            self.store.clone(),
            address,
            generation,
            self.transition_delay,
            cancel_rx,
        ));
        Ok(())
    }

    pub fn remove_peer(&self, address: &str) -> Result<(), EngineError> {
        self.faults.check("remove_peer")?;

        let mut store = self.store.write();
        let removed = store.remove(address)?;
        info!(
            peer_ip = %address,
            state = %removed.session.state,
            total_peers = store.len(),
            "peer removed"
        );
        Ok(())
    }

    pub fn update_peer(&self, config: PeerConfig) -> Result<(), EngineError> {
        self.faults.check("update_peer")?;
        config.validate()?;

        let address = config.address.clone();
        self.store.write().update_config(config, SystemTime::now())?;
        info!(peer_ip = %address, "peer updated");
        Ok(())
    }

    pub fn get_session_state(&self, address: &str) -> Result<SessionState, EngineError> {
        self.store
            .read()
            .get(address)
            .map(|entry| entry.session.clone())
            .ok_or_else(|| EngineError::SessionNotFound(address.to_string()))
    }

    pub fn get_all_sessions(&self) -> Vec<SessionState> {
        self.store.read().sessions()
    }

    pub fn get_all_peers(&self) -> Vec<PeerConfig> {
        self.store.read().peers()
    }

    /// Rendered from a snapshot; the store lock is released before rendering.
    pub fn get_running_config(&self) -> String {
        let peers = self.get_all_peers();
        render_running_config(&peers)
    }

    pub fn stats(&self) -> EngineStats {
        let store = self.store.read();
        let mut by_state = HashMap::new();
        for entry in store.entries() {
            *by_state.entry(entry.session.state).or_insert(0) += 1;
        }
        EngineStats {
            peers: store.len(),
            established: by_state.get(&BgpState::Established).copied().unwrap_or(0),
            by_state,
            fault_injection: self.faults.is_enabled(),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.store.write().cancel_all();
    }
}

impl SessionEngine for Coordinator {
    fn add_peer(&self, config: PeerConfig) -> Result<(), EngineError> {
        Coordinator::add_peer(self, config)
    }

    fn remove_peer(&self, address: &str) -> Result<(), EngineError> {
        Coordinator::remove_peer(self, address)
    }

    fn update_peer(&self, config: PeerConfig) -> Result<(), EngineError> {
        Coordinator::update_peer(self, config)
    }

    fn get_session_state(&self, address: &str) -> Result<SessionState, EngineError> {
        Coordinator::get_session_state(self, address)
    }

    fn get_all_sessions(&self) -> Vec<SessionState> {
        Coordinator::get_all_sessions(self)
    }

    fn get_running_config(&self) -> String {
        Coordinator::get_running_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(delay_ms: u64) -> Coordinator {
        Coordinator::new(EngineConfig::new(Duration::from_millis(delay_ms), false))
    }

    #[tokio::test]
    async fn test_add_peer_starts_idle() {
        let engine = coordinator(1000);
        engine
            .add_peer(PeerConfig::new("192.168.1.1", 65000, 65001))
            .unwrap();

        let session = engine.get_session_state("192.168.1.1").unwrap();
        assert_eq!(session.state, BgpState::Idle);

        let peers = engine.get_all_peers();
        assert_eq!(peers.len(), 1);
        assert!(peers[0].created_at.is_some());
        assert_eq!(peers[0].created_at, peers[0].updated_at);
        assert_eq!(peers[0].created_at, Some(session.entered_at));
    }

    #[tokio::test]
    async fn test_add_peer_validation() {
        let engine = coordinator(1000);
        let invalid = vec![
            PeerConfig::new("", 65000, 65001),
            PeerConfig::new("10.0.0.1", 0, 65001),
            PeerConfig::new("10.0.0.1", 65000, 0),
        ];
        for peer in invalid {
            assert!(matches!(
                engine.add_peer(peer),
                Err(EngineError::Validation(_))
            ));
        }
        assert!(engine.get_all_peers().is_empty());
        assert!(engine.get_all_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_update_peer_validation_and_not_found() {
        let engine = coordinator(1000);
        assert_eq!(
            engine.update_peer(PeerConfig::new("10.0.0.1", 65000, 65001)),
            Err(EngineError::PeerNotFound("10.0.0.1".to_string()))
        );

        engine
            .add_peer(PeerConfig::new("10.0.0.1", 65000, 65001))
            .unwrap();
        assert!(matches!(
            engine.update_peer(PeerConfig::new("10.0.0.1", 65000, 0)),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(engine.get_all_peers()[0].remote_asn, 65001);
    }

    #[tokio::test]
    async fn test_fault_injection_checked_before_validation() {
        let engine = Coordinator::new(EngineConfig::new(Duration::from_millis(10), true));
        assert!(engine.fault_injection_enabled());

        // Invalid input still yields SimulatedFailure
        assert!(matches!(
            engine.add_peer(PeerConfig::new("", 0, 0)),
            Err(EngineError::SimulatedFailure(_))
        ));
        assert!(matches!(
            engine.remove_peer("10.0.0.1"),
            Err(EngineError::SimulatedFailure(_))
        ));
        assert!(matches!(
            engine.update_peer(PeerConfig::new("10.0.0.1", 1, 2)),
            Err(EngineError::SimulatedFailure(_))
        ));

        // Reads are unaffected
        assert!(engine.get_all_sessions().is_empty());
        assert_eq!(engine.get_running_config(), "");
        assert!(matches!(
            engine.get_session_state("10.0.0.1"),
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stats() {
        let engine = coordinator(1000);
        engine.add_peer(PeerConfig::new("10.0.0.1", 65000, 1)).unwrap();
        engine.add_peer(PeerConfig::new("10.0.0.2", 65000, 2)).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.peers, 2);
        assert_eq!(stats.established, 0);
        assert_eq!(stats.count(BgpState::Idle), 2);
        assert_eq!(stats.count(BgpState::Established), 0);
        assert!(!stats.fault_injection);

        engine.set_fault_injection(true);
        assert!(engine.stats().fault_injection);
    }

    #[test]
    fn test_with_runtime_outside_async_context() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let engine = Coordinator::with_runtime(
            EngineConfig::new(Duration::from_millis(1), false),
            runtime.handle().clone(),
        );

        engine.add_peer(PeerConfig::new("10.0.0.1", 65000, 65001)).unwrap();
        runtime.block_on(async {
            for _ in 0..200 {
                if engine.get_session_state("10.0.0.1").unwrap().is_established() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("session never established");
        });
    }
}
