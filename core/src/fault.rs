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

use crate::error::EngineError;
use crate::log::warn;
use std::sync::atomic::{AtomicBool, Ordering};

/// Switch that makes every mutating engine call fail with
/// `SimulatedFailure` before any validation or storage work.
#[derive(Debug, Default)]
pub struct FaultInjector {
    enabled: AtomicBool,
}

impl FaultInjector {
    pub fn new(enabled: bool) -> Self {
        FaultInjector {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Gate for a mutating operation named `op`.
    pub fn check(&self, op: &str) -> Result<(), EngineError> {
        if self.is_enabled() {
            warn!(op, "fault injection rejected request");
            return Err(EngineError::SimulatedFailure(op.to_string()));
        }
        Ok(())
    }
}
