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

//! Session change feed for broadcasters: poll an engine, emit deltas.

use crate::engine::SessionEngine;
use crate::log::debug;
use crate::peer::{BgpState, SessionState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A change between two session snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Added(SessionState),
    StateChanged {
        from: BgpState,
        to: BgpState,
        session: SessionState,
    },
    Removed {
        address: String,
    },
}

impl SessionEvent {
    pub fn address(&self) -> &str {
        match self {
            SessionEvent::Added(session) => &session.address,
            SessionEvent::StateChanged { session, .. } => &session.address,
            SessionEvent::Removed { address } => address,
        }
    }
}

/// Deltas that turn `prev` into `next`: removals first, then additions and
/// state changes in `next` order.
pub fn diff_sessions(prev: &[SessionState], next: &[SessionState]) -> Vec<SessionEvent> {
    let before: HashMap<&str, &SessionState> =
        prev.iter().map(|s| (s.address.as_str(), s)).collect();
    let after: HashMap<&str, &SessionState> =
        next.iter().map(|s| (s.address.as_str(), s)).collect();

    let mut events: Vec<SessionEvent> = prev
        .iter()
        .filter(|s| !after.contains_key(s.address.as_str()))
        .map(|s| SessionEvent::Removed {
            address: s.address.clone(),
        })
        .collect();

    for session in next {
        match before.get(session.address.as_str()) {
            None => events.push(SessionEvent::Added(session.clone())),
            // A remove + re-add between polls shows up as a state reset.
            Some(old) if old.state != session.state || old.entered_at != session.entered_at => {
                events.push(SessionEvent::StateChanged {
                    from: old.state,
                    to: session.state,
                    session: session.clone(),
                });
            }
            Some(_) => {}
        }
    }
    events
}

/// Polls an engine's sessions on a fixed interval and sends deltas to a
/// channel until the receiver goes away.
pub struct SessionWatcher<E: SessionEngine + ?Sized> {
    engine: Arc<E>,
    interval: Duration,
}

impl<E: SessionEngine + ?Sized + 'static> SessionWatcher<E> {
    pub fn new(engine: Arc<E>, interval: Duration) -> Self {
        SessionWatcher { engine, interval }
    }

    /// Run the watcher on its own task.
    pub fn spawn(self) -> (mpsc::UnboundedReceiver<SessionEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    pub async fn run(self, tx: mpsc::UnboundedSender<SessionEvent>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last: Vec<SessionState> = Vec::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => {
                    debug!("session watcher receiver dropped");
                    return;
                }
            }

            let current = self.engine.get_all_sessions();
            for event in diff_sessions(&last, &current) {
                if tx.send(event).is_err() {
                    debug!("session watcher receiver dropped");
                    return;
                }
            }
            last = current;
        }
    }
}
