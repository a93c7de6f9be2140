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

//! Running-configuration text for a snapshot of peers.

use crate::config::PeerConfig;
use std::fmt::Write;

/// Render one `router bgp` block per peer, in the order given.
///
/// Values are substituted literally. The output is meant for humans and
/// backups, not for parsing back.
pub fn render_running_config(peers: &[PeerConfig]) -> String {
    let mut out = String::new();
    for peer in peers {
        render_peer(&mut out, peer);
    }
    out
}

fn render_peer(out: &mut String, peer: &PeerConfig) {
    let addr = &peer.address;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "router bgp {}", peer.local_asn);
    let _ = writeln!(out, " neighbor {} remote-as {}", addr, peer.remote_asn);

    if let Some(password) = &peer.password {
        let _ = writeln!(out, " neighbor {} password {}", addr, password);
    }
    if peer.multihop > 0 {
        let _ = writeln!(out, " neighbor {} ebgp-multihop {}", addr, peer.multihop);
    }
    if let Some(source) = &peer.update_source {
        let _ = writeln!(out, " neighbor {} update-source {}", addr, source);
    }
    if let Some(name) = &peer.route_map_in {
        let _ = writeln!(out, " neighbor {} route-map {} in", addr, name);
    }
    if let Some(name) = &peer.route_map_out {
        let _ = writeln!(out, " neighbor {} route-map {} out", addr, name);
    }
    if let Some(name) = &peer.prefix_list_in {
        let _ = writeln!(out, " neighbor {} prefix-list {} in", addr, name);
    }
    if let Some(name) = &peer.prefix_list_out {
        let _ = writeln!(out, " neighbor {} prefix-list {} out", addr, name);
    }
    if peer.max_prefix > 0 {
        let _ = writeln!(out, " neighbor {} maximum-prefix {}", addr, peer.max_prefix);
    }
    out.push_str("!\n");
}
