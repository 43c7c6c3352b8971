//! Walk configuration.
//!
//! [`WalkConfig`] deserializes with every field optional, so it can sit in a
//! host application's configuration file:
//!
//! ```
//! use plc_marshal::{MissingMemberPolicy, WalkConfig};
//!
//! let config: WalkConfig = serde_json::from_str(r#"{ "missing_member": "fail" }"#).unwrap();
//! assert_eq!(config.missing_member, MissingMemberPolicy::Fail);
//! assert_eq!(config.max_depth, WalkConfig::DEFAULT_MAX_DEPTH);
//! ```

use serde::{Deserialize, Serialize};

/// What a walk does when a child symbol has no counterpart in the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMemberPolicy {
    /// The child contributes nothing, as if its value were null.
    #[default]
    Skip,
    /// The walk fails with [`Error::MissingMember`](crate::Error::MissingMember).
    Fail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Applies to struct members that do not exist and leaf values the
    /// backend did not supply. Explicit nulls are always skipped, and an
    /// array element outside the value's bounds is always an error.
    pub missing_member: MissingMemberPolicy,
    /// Nesting depth at which a walk gives up with
    /// [`Error::DepthLimit`](crate::Error::DepthLimit). Guards against cyclic
    /// symbol tables.
    pub max_depth: usize,
}

impl WalkConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn strict() -> Self {
        Self {
            missing_member: MissingMemberPolicy::Fail,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            missing_member: MissingMemberPolicy::Skip,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
