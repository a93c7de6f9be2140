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

use bgpsim::config::Config;
use bgpsim::server::Coordinator;
use bgpsim::watch::{SessionEvent, SessionWatcher};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bgpsimd")]
#[command(about = "BGP session simulator daemon", version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Print a JSON snapshot of sessions and stats on shutdown
    #[arg(long)]
    dump: bool,
}

fn init_logging(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("bgpsim={level},bgpsimd={level}"));
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Added(session) => {
            info!(peer_ip = %session.address, state = %session.state, "session added");
        }
        SessionEvent::StateChanged { from, to, session } => {
            info!(peer_ip = %session.address, %from, %to, "session state changed");
        }
        SessionEvent::Removed { address } => {
            info!(peer_ip = %address, "session removed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config).unwrap_or_else(|e| {
        eprintln!("Error: failed to load config from {}: {}", &args.config, e);
        eprintln!("Info: using default configuration");
        Config::default()
    });

    init_logging(&config.log_level);
    info!(
        config = %args.config,
        transition_delay_ms = config.transition_delay_ms,
        fault_injection = config.fault_injection,
        peers = config.peers.len(),
        "starting session simulator"
    );

    let engine = Arc::new(Coordinator::new(config.engine_config()));

    let (mut events, watcher) =
        SessionWatcher::new(engine.clone(), config.watch_interval()).spawn();

    for peer in config.peers.iter().cloned() {
        let address = peer.address.clone();
        if let Err(e) = engine.add_peer(peer) {
            error!(peer_ip = %address, error = %e, "failed to add configured peer");
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => log_event(&event),
                    None => {
                        warn!("session watcher stopped");
                        break;
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "failed to listen for shutdown signal");
                }
                info!("shutting down");
                break;
            }
        }
    }

    drop(events);
    if let Err(e) = watcher.await {
        error!(error = %e, "session watcher failed");
    }

    print!("{}", engine.get_running_config());

    if args.dump {
        let snapshot = json!({
            "peers": engine.get_all_peers(),
            "sessions": engine.get_all_sessions(),
            "stats": engine.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}
