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

//! Session establishment states and the fixed order they are walked in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BGP FSM states (RFC 4271 8.2.2), in establishment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BgpState {
    Idle,
    Connect,
    Active,
    OpenSent,
    OpenConfirm,
    Established,
}

impl BgpState {
    /// Every state in the order a session enters them.
    pub const SEQUENCE: [BgpState; 6] = [
        BgpState::Idle,
        BgpState::Connect,
        BgpState::Active,
        BgpState::OpenSent,
        BgpState::OpenConfirm,
        BgpState::Established,
    ];

    /// The state entered after this one. `Established` is terminal: a
    /// session only leaves it by being removed.
    pub fn next(self) -> Option<BgpState> {
        match self {
            BgpState::Idle => Some(BgpState::Connect),
            BgpState::Connect => Some(BgpState::Active),
            BgpState::Active => Some(BgpState::OpenSent),
            BgpState::OpenSent => Some(BgpState::OpenConfirm),
            BgpState::OpenConfirm => Some(BgpState::Established),
            BgpState::Established => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BgpState::Idle => "Idle",
            BgpState::Connect => "Connect",
            BgpState::Active => "Active",
            BgpState::OpenSent => "OpenSent",
            BgpState::OpenConfirm => "OpenConfirm",
            BgpState::Established => "Established",
        }
    }
}

impl fmt::Display for BgpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
