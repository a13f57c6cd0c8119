// Copyright 2025 eraflo
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

//! Logger bootstrap for applications and tests.

use env_logger::{Builder, Env};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn builder() -> Builder {
    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
}

/// Installs `env_logger` as the global logger. `RUST_LOG` overrides the default filter.
///
/// Calling this more than once is harmless; only the first call installs a logger.
pub fn init() {
    if let Err(e) = builder().try_init() {
        log::debug!("Logger already initialised: {e}");
    }
}

/// Installs a logger whose output is captured by the test harness.
pub fn init_for_tests() {
    let _ = builder().is_test(true).try_init();
}
