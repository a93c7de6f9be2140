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

use std::fmt;

/// Errors returned by the session engine's control-plane operations.
///
/// Every variant carries the address (or a description) it relates to.
/// None of them leave a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Peer configuration is malformed or missing a required field
    Validation(String),
    /// A peer with this address is already registered
    DuplicatePeer(String),
    /// No peer configured with this address
    PeerNotFound(String),
    /// No session tracked for this address
    SessionNotFound(String),
    /// Fault injection is active and rejected the call
    SimulatedFailure(String),
}

impl EngineError {
    /// Whether the caller is at fault (maps to a 4xx upstream). Injected
    /// failures look like downstream faults and are not client errors.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::SimulatedFailure(_))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "invalid peer configuration: {}", msg),
            EngineError::DuplicatePeer(addr) => write!(f, "peer {} already exists", addr),
            EngineError::PeerNotFound(addr) => write!(f, "peer {} not found", addr),
            EngineError::SessionNotFound(addr) => write!(f, "session {} not found", addr),
            EngineError::SimulatedFailure(op) => write!(f, "{} failed: control plane unavailable", op),
        }
    }
}

impl std::error::Error for EngineError {}
