use busline_shared::Masked;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A single permission an actor may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ListTrips,
    RequestTicket,
    /// Create, update and delete trips; issue tickets; approve requests.
    ManageTrips,
    SellTicket,
    RefundTicket,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ListTrips => "list trips",
            Capability::RequestTicket => "request tickets",
            Capability::ManageTrips => "manage trips",
            Capability::SellTicket => "sell tickets",
            Capability::RefundTicket => "refund tickets",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    pub fn remove(&mut self, capability: Capability) -> bool {
        self.0.remove(&capability)
    }

    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        Self(self.0.union(&other.0).copied().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Preset capability bundles.
///
/// Roles are only a starting point: an actor's effective permissions are the
/// capability set it carries, which can be widened or narrowed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Authorized,
    TripManager,
    BusManager,
    Superuser,
}

impl Role {
    pub fn capabilities(self) -> CapabilitySet {
        match self {
            Role::Guest => [Capability::ListTrips].into_iter().collect(),
            Role::Authorized => {
                let mut caps = Role::Guest.capabilities();
                caps.insert(Capability::RequestTicket);
                caps
            }
            Role::TripManager => {
                let mut caps = Role::Authorized.capabilities();
                caps.insert(Capability::ManageTrips);
                caps
            }
            Role::BusManager => {
                let mut caps = Role::Authorized.capabilities();
                caps.insert(Capability::SellTicket);
                caps.insert(Capability::RefundTicket);
                caps
            }
            Role::Superuser => Role::TripManager
                .capabilities()
                .union(&Role::BusManager.capabilities()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Guest => "Guest",
            Role::Authorized => "Authorized user",
            Role::TripManager => "Trip manager",
            Role::BusManager => "Bus manager",
            Role::Superuser => "Superuser",
        };
        f.write_str(label)
    }
}

/// Anyone interacting with the booking system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub role: Role,
    capabilities: CapabilitySet,
}

impl Actor {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: Masked(email.into()),
            role,
            capabilities: role.capabilities(),
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Every actor may list trips, whatever its capability set says.
    pub fn can(&self, capability: Capability) -> bool {
        capability == Capability::ListTrips || self.capabilities.contains(capability)
    }

    /// Gate for every privileged operation.
    pub fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.can(capability) {
            return Ok(());
        }

        tracing::warn!(actor = %self.id, role = %self.role, %capability, "Capability check failed");
        Err(CoreError::Forbidden {
            actor: self.id,
            capability,
        })
    }

    pub fn grant(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
    }

    /// Returns whether the capability was removed. `ListTrips` is never removed.
    pub fn revoke(&mut self, capability: Capability) -> bool {
        if capability == Capability::ListTrips {
            return false;
        }
        self.capabilities.remove(capability)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.role, self.name, self.id)
    }
}
