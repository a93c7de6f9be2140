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

//! The control-plane contract session engines expose to upstream code.

use crate::config::PeerConfig;
use crate::error::EngineError;
use crate::peer::SessionState;

/// Operations REST handlers, pollers and broadcasters rely on. The
/// in-memory simulator implements it, and so can an engine that speaks
/// BGP on the wire, so callers never depend on which one they hold.
///
/// All operations are synchronous and return immediately; none retries.
pub trait SessionEngine: Send + Sync {
    /// Register a peer and start establishing its session.
    fn add_peer(&self, config: PeerConfig) -> Result<(), EngineError>;

    /// Remove a peer and its session, stopping any establishment work.
    fn remove_peer(&self, address: &str) -> Result<(), EngineError>;

    /// Replace a peer's non-identity configuration. The session is kept.
    ///
    /// The fault check runs first, then field validation, then the address
    /// lookup. An invalid config for an unknown address therefore fails
    /// with `Validation`, not `PeerNotFound`.
    fn update_peer(&self, config: PeerConfig) -> Result<(), EngineError>;

    fn get_session_state(&self, address: &str) -> Result<SessionState, EngineError>;

    /// Every session, copied under a single lock acquisition.
    fn get_all_sessions(&self) -> Vec<SessionState>;

    /// Running configuration for every peer.
    fn get_running_config(&self) -> String;
}
