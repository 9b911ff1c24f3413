use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of the virtual root every section hangs off.
pub const ROOT_ID: &str = "__root";

/// Number of 3-digit suffixes tried before the suffix range widens.
const NARROW_ATTEMPTS: usize = 64;

/// Textual identifier of a node (section, document, or idea).
///
/// Mindly writes identifiers like `id1714556400_17`. Identifiers are opaque
/// to this crate; the only one with meaning is [`NodeId::root`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The virtual root marker.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Returns `true` for the virtual root marker.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(TypeError::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Generate a fresh identifier in Mindly's `id{seconds}_{n}` style.
///
/// Mindly's own suffix is an incrementing counter; here it is a random
/// 3-digit number. Candidates for which `taken` returns `true` are redrawn,
/// and after a bounded number of attempts the suffix range widens so that
/// generation always terminates.
pub fn generate_id(mut taken: impl FnMut(&str) -> bool) -> NodeId {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let mut rng = rand::thread_rng();
    let mut attempt = 0usize;
    loop {
        let suffix: u64 = if attempt < NARROW_ATTEMPTS {
            rng.gen_range(100..=999)
        } else {
            rng.gen_range(1_000..=999_999)
        };
        let candidate = format!("id{secs}_{suffix}");
        if !taken(&candidate) {
            return NodeId(candidate);
        }
        attempt += 1;
    }
}
