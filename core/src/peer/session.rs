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

use super::fsm::BgpState;
use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Prefixes packed into each simulated UPDATE
const PREFIXES_PER_UPDATE: u64 = 10;

/// A state the session entered and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateEntry {
    pub state: BgpState,
    pub entered_at: SystemTime,
}

/// Runtime view of one peer's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub address: String,
    pub state: BgpState,
    pub entered_at: SystemTime,
    /// Every state entered so far, oldest first. The last entry always
    /// matches `state` and `entered_at`.
    pub history: Vec<StateEntry>,
    pub prefixes_received: u64,
    pub prefixes_sent: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub last_error: Option<String>,
}

impl SessionState {
    /// New session in Idle.
    pub fn new(address: &str, now: SystemTime) -> Self {
        SessionState {
            address: address.to_string(),
            state: BgpState::Idle,
            entered_at: now,
            history: vec![StateEntry {
                state: BgpState::Idle,
                entered_at: now,
            }],
            prefixes_received: 0,
            prefixes_sent: 0,
            messages_received: 0,
            messages_sent: 0,
            last_error: None,
        }
    }

    pub fn is_established(&self) -> bool {
        self.state == BgpState::Established
    }

    /// Entry time of `state`, if the session has reached it.
    pub fn entered(&self, state: BgpState) -> Option<SystemTime> {
        self.history
            .iter()
            .find(|entry| entry.state == state)
            .map(|entry| entry.entered_at)
    }

    /// Move to the next state and account for the messages exchanged on
    /// the way. Returns the new state, or None if already Established.
    ///
    /// `max_prefix` caps the received prefix count (0 = unlimited).
    pub fn advance(&mut self, now: SystemTime, max_prefix: u32) -> Option<BgpState> {
        let next = self.state.next()?;

        // Entry times are strictly increasing even if the wall clock steps back.
        let floor = self.entered_at + Duration::from_micros(1);
        let entered_at = if now > self.entered_at { now } else { floor };

        match next {
            BgpState::OpenSent => {
                // OPEN
                self.messages_sent += 1;
            }
            BgpState::OpenConfirm => {
                // peer's OPEN, our KEEPALIVE
                self.messages_received += 1;
                self.messages_sent += 1;
            }
            BgpState::Established => {
                // peer's KEEPALIVE, then the initial table exchange
                self.messages_received += 1;
                self.load_initial_routes(max_prefix);
            }
            _ => {}
        }

        self.state = next;
        self.entered_at = entered_at;
        self.history.push(StateEntry {
            state: next,
            entered_at,
        });
        Some(next)
    }

    /// Fill in route and UPDATE counters for a freshly established
    /// session. Values derive from the address so repeated runs agree.
    fn load_initial_routes(&mut self, max_prefix: u32) {
        let seed = self
            .address
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

        let mut received = 1 + seed % 1000;
        if max_prefix > 0 {
            received = received.min(max_prefix as u64);
        }
        let sent = 1 + (seed / 1000) % 500;

        self.prefixes_received = received;
        self.prefixes_sent = sent;
        self.messages_received += received.div_ceil(PREFIXES_PER_UPDATE);
        self.messages_sent += sent.div_ceil(PREFIXES_PER_UPDATE);
    }
}
