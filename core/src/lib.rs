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

//! In-memory BGP peer store and session establishment engine.
//!
//! [`server::Coordinator`] owns the peers, walks each new session from
//! Idle to Established on a timer, and implements the
//! [`engine::SessionEngine`] contract upstream layers program against.

pub mod config;
pub mod engine;
pub mod error;
pub mod fault;
pub mod log;
pub mod peer;
pub mod running_config;
pub mod server;
pub mod watch;

pub use config::{Config, EngineConfig, PeerConfig};
pub use engine::SessionEngine;
pub use error::EngineError;
pub use peer::{BgpState, SessionState};
pub use server::{Coordinator, EngineStats};
