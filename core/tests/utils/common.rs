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

//! Common test utilities for session engine testing

use bgpsim::config::{EngineConfig, PeerConfig};
use bgpsim::peer::{BgpState, SessionState};
use bgpsim::server::Coordinator;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing_subscriber::EnvFilter;

/// Transition delay used by most tests
pub const TEST_DELAY: Duration = Duration::from_millis(10);

/// Initialize tracing for tests. Call at the start of each test.
/// Uses RUST_LOG env var, defaulting to debug for bgpsim only.
/// Safe to call multiple times - only first call takes effect.
pub fn init_test_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "bgpsim=debug".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Engine with the given transition delay and fault injection setting
pub fn start_test_engine(delay: Duration, fault_injection: bool) -> Arc<Coordinator> {
    init_test_logging();
    Arc::new(Coordinator::new(EngineConfig::new(delay, fault_injection)))
}

pub fn peer(address: &str, local_asn: u32, remote_asn: u32) -> PeerConfig {
    PeerConfig::new(address, local_asn, remote_asn)
}

/// Time one full walk from Idle to Established takes at minimum
pub fn full_walk(delay: Duration) -> Duration {
    delay * (BgpState::SEQUENCE.len() as u32 - 1)
}

/// Generic polling helper that retries until a condition is met
pub async fn poll_until_with_timeout<F>(check: F, timeout_message: &str, max_iterations: usize)
where
    F: Fn() -> bool,
{
    for _ in 0..max_iterations {
        if check() {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }

    panic!("{}", timeout_message);
}

/// Generic polling helper that retries until a condition is met (default 5s timeout)
pub async fn poll_until<F>(check: F, timeout_message: &str)
where
    F: Fn() -> bool,
{
    poll_until_with_timeout(check, timeout_message, 1000).await;
}

/// Wait until every listed session is Established
pub async fn poll_established(engine: &Coordinator, addresses: &[&str]) {
    poll_until(
        || {
            addresses.iter().all(|addr| {
                engine
                    .get_session_state(addr)
                    .map(|s| s.is_established())
                    .unwrap_or(false)
            })
        },
        "sessions did not reach Established",
    )
    .await;
}

/// Assert a session's history is exactly one forward walk with strictly
/// increasing entry times
pub fn assert_monotonic_history(session: &SessionState) {
    let states: Vec<BgpState> = session.history.iter().map(|e| e.state).collect();
    assert_eq!(
        states,
        BgpState::SEQUENCE[..states.len()].to_vec(),
        "history of {} is not a forward walk",
        session.address
    );
    for pair in session.history.windows(2) {
        assert!(
            pair[1].entered_at > pair[0].entered_at,
            "{} entered {:?} no later than {:?}",
            session.address,
            pair[1].state,
            pair[0].state
        );
    }
    let last = session.history.last().expect("history is never empty");
    assert_eq!(last.state, session.state);
    assert_eq!(last.entered_at, session.entered_at);
}
