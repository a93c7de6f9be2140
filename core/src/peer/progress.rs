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

//! Background walk of one session from Idle to Established.

use super::fsm::BgpState;
use super::store::SharedStore;
use crate::log::{debug, info};
use std::time::{Duration, SystemTime};
use tokio::sync::oneshot;

/// Why a progression task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionExit {
    /// Session reached Established
    Established,
    /// Peer was removed (or removed and re-added) while the task ran
    Cancelled,
}

/// Advance one session through every state, sleeping `delay` before each
/// transition.
///
/// The task only suspends on the delay timer and never while holding the
/// store lock. Before every write it re-checks that the peer still exists
/// with the generation the task was started for, so a task belonging to a
/// removed peer can never touch a newer peer with the same address.
pub async fn run_session_progression(
    store: SharedStore,
    address: String,
    generation: u64,
    delay: Duration,
    mut cancel: oneshot::Receiver<()>,
) -> ProgressionExit {
    loop {
        {
            let guard = store.read();
            match guard.get(&address) {
                Some(entry) if entry.generation == generation => {
                    if entry.session.is_established() {
                        return ProgressionExit::Established;
                    }
                }
                _ => {
                    debug!(peer_ip = %address, generation, "peer gone, progression stopped");
                    return ProgressionExit::Cancelled;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut cancel => {
                debug!(peer_ip = %address, generation, "progression cancelled");
                return ProgressionExit::Cancelled;
            }
        }

        let mut guard = store.write();
        let Some(entry) = guard.current_mut(&address, generation) else {
            debug!(peer_ip = %address, generation, "peer removed during transition delay");
            return ProgressionExit::Cancelled;
        };

        let max_prefix = entry.config.max_prefix;
        let Some(state) = entry.session.advance(SystemTime::now(), max_prefix) else {
            return ProgressionExit::Established;
        };
        info!(peer_ip = %address, %state, "peer state changed");

        if state == BgpState::Established {
            let session = &entry.session;
            info!(
                peer_ip = %address,
                prefixes_received = session.prefixes_received,
                prefixes_sent = session.prefixes_sent,
                "session established"
            );
            return ProgressionExit::Established;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerConfig;
    use crate::peer::session::SessionState;
    use crate::peer::store::PeerEntry;

    const DELAY: Duration = Duration::from_millis(5);

    fn add_entry(store: &SharedStore, address: &str, generation: u64) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let entry = PeerEntry::new(
            PeerConfig::new(address, 65000, 65001),
            SessionState::new(address, SystemTime::now()),
            generation,
            tx,
        );
        store.write().insert(entry).unwrap();
        rx
    }

    #[tokio::test]
    async fn test_progression_reaches_established() {
        let store = SharedStore::new();
        let rx = add_entry(&store, "10.0.0.1", 1);

        let exit = run_session_progression(store.clone(), "10.0.0.1".to_string(), 1, DELAY, rx).await;
        assert_eq!(exit, ProgressionExit::Established);

        let guard = store.read();
        let session = &guard.get("10.0.0.1").unwrap().session;
        assert_eq!(session.state, BgpState::Established);
        assert_eq!(session.history.len(), BgpState::SEQUENCE.len());
        assert!(session.prefixes_received > 0);
    }

    #[tokio::test]
    async fn test_progression_stops_on_cancel() {
        let store = SharedStore::new();
        let rx = add_entry(&store, "10.0.0.1", 1);

        let task = tokio::spawn(run_session_progression(
            store.clone(),
            "10.0.0.1".to_string(),
            1,
            Duration::from_secs(60),
            rx,
        ));

        store.write().remove("10.0.0.1").unwrap();
        assert_eq!(task.await.unwrap(), ProgressionExit::Cancelled);
    }

    #[tokio::test]
    async fn test_stale_generation_never_writes() {
        let store = SharedStore::new();
        // Task started for generation 1, but the live entry is generation 2.
        let _live = add_entry(&store, "10.0.0.1", 2);
        let (_tx, rx) = oneshot::channel();

        let exit = run_session_progression(store.clone(), "10.0.0.1".to_string(), 1, DELAY, rx).await;
        assert_eq!(exit, ProgressionExit::Cancelled);

        let guard = store.read();
        assert_eq!(guard.get("10.0.0.1").unwrap().session.state, BgpState::Idle);
    }

    #[tokio::test]
    async fn test_missing_peer_exits_immediately() {
        let store = SharedStore::new();
        let (_tx, rx) = oneshot::channel();
        let exit = run_session_progression(store, "10.0.0.9".to_string(), 1, DELAY, rx).await;
        assert_eq!(exit, ProgressionExit::Cancelled);
    }
}
