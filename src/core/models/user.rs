//! User identity as supplied by the host's authentication layer

use serde::{Deserialize, Serialize};

/// Ordered permission level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(pub u8);

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tier {}", self.0)
    }
}

/// A user acting on the engine
///
/// Owned by the authentication subsystem; the engine reads it per decision
/// and keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// Permission level
    pub tier: Tier,
    /// Bypasses every tier threshold
    #[serde(default)]
    pub superuser: bool,
}

impl User {
    /// A regular user at the given tier
    pub fn new(id: impl Into<String>, tier: u8) -> Self {
        Self {
            id: id.into(),
            tier: Tier(tier),
            superuser: false,
        }
    }

    /// A superuser
    pub fn superuser(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tier: Tier::default(),
            superuser: true,
        }
    }

    /// The part of the identity authorization decisions look at
    #[must_use]
    pub const fn authority(&self) -> Authority {
        Authority {
            tier: self.tier,
            superuser: self.superuser,
        }
    }
}

/// Tier plus superuser flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority {
    /// Permission level
    pub tier: Tier,
    /// Bypasses every tier threshold
    pub superuser: bool,
}

impl Authority {
    /// Whether this authority clears a tier threshold
    #[must_use]
    pub fn meets(self, min: Tier) -> bool {
        self.superuser || self.tier >= min
    }
}
