//! # Runtime Configuration Module
//!
//! Router behavior that operators may want to change without touching the
//! route tree, loaded from environment variables or embedded in a host
//! application's own configuration via `serde`.
//!
//! ## Environment Variables
//!
//! ### `VERBTREE_BACKTRACK`
//!
//! Which routing errors let sibling alternatives run:
//! - `strict` (default): only "not found" is recoverable.
//! - `merge-methods`: "method not allowed" is recoverable too, and the methods
//!   collected from every matching branch are reported together.
//!
//! ### `VERBTREE_EMIT_VARY`
//!
//! `true` (default) or `false`. When enabled, successful responses carry a
//! `Vary` header listing the request headers routing depended on.
//!
//! ## Usage
//!
//! ```rust
//! use verbtree::runtime_config::{BacktrackPolicy, RouterConfig};
//!
//! let config = RouterConfig::from_env();
//! assert!(matches!(config.backtrack, BacktrackPolicy::Strict | BacktrackPolicy::MergeMethods));
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

pub const BACKTRACK_ENV: &str = "VERBTREE_BACKTRACK";
pub const EMIT_VARY_ENV: &str = "VERBTREE_EMIT_VARY";

/// Which routing errors are ignorable during backtracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BacktrackPolicy {
    #[default]
    Strict,
    MergeMethods,
}

impl BacktrackPolicy {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(BacktrackPolicy::Strict),
            "merge-methods" | "merge_methods" => Some(BacktrackPolicy::MergeMethods),
            _ => None,
        }
    }
}

/// Router configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub backtrack: BacktrackPolicy,
    pub emit_vary: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backtrack: BacktrackPolicy::Strict,
            emit_vary: true,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup; unrecognised values
    /// fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let backtrack = match lookup(BACKTRACK_ENV) {
            Some(raw) => BacktrackPolicy::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, var = BACKTRACK_ENV, "Unknown backtrack policy, using strict");
                defaults.backtrack
            }),
            None => defaults.backtrack,
        };

        let emit_vary = match lookup(EMIT_VARY_ENV) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    warn!(value = %raw, var = EMIT_VARY_ENV, "Invalid boolean, using default");
                    defaults.emit_vary
                }
            },
            None => defaults.emit_vary,
        };

        RouterConfig {
            backtrack,
            emit_vary,
        }
    }
}
