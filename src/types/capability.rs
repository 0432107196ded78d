use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single named permission a role can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageRoles,
    ManageUsers,
    DeleteThreads,
    PinThreads,
    CreateThreads,
    Reply,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ManageRoles,
        Capability::ManageUsers,
        Capability::DeleteThreads,
        Capability::PinThreads,
        Capability::CreateThreads,
        Capability::Reply,
    ];

    const fn bit(self) -> u32 {
        match self {
            Capability::ManageRoles => 1 << 0,
            Capability::ManageUsers => 1 << 1,
            Capability::DeleteThreads => 1 << 2,
            Capability::PinThreads => 1 << 3,
            Capability::CreateThreads => 1 << 4,
            Capability::Reply => 1 << 5,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Capability::ManageRoles => "can_manage_roles",
            Capability::ManageUsers => "can_manage_users",
            Capability::DeleteThreads => "can_delete_threads",
            Capability::PinThreads => "can_pin_threads",
            Capability::CreateThreads => "can_create_threads",
            Capability::Reply => "can_reply",
        }
    }

    /// Exact-match lookup of a wire name.
    pub fn parse(s: &str) -> Option<Capability> {
        Self::ALL.into_iter().find(|c| c.name() == s)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CapabilitySet is a bitmask of granted capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw bits, dropping bits that name no capability.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        let mut known = 0;
        let mut i = 0;
        while i < Capability::ALL.len() {
            known |= Capability::ALL[i].bit();
            i += 1;
        }
        Self(bits & known)
    }

    #[must_use]
    pub const fn has(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn with(self, capability: Capability) -> CapabilitySet {
        CapabilitySet(self.0 | capability.bit())
    }

    /// admin: everything that governs other users' content and accounts.
    #[must_use]
    pub const fn admin_defaults() -> CapabilitySet {
        CapabilitySet::empty()
            .with(Capability::ManageRoles)
            .with(Capability::ManageUsers)
            .with(Capability::DeleteThreads)
            .with(Capability::PinThreads)
    }

    #[must_use]
    pub const fn moderator_defaults() -> CapabilitySet {
        CapabilitySet::empty()
            .with(Capability::DeleteThreads)
            .with(Capability::PinThreads)
    }

    #[must_use]
    pub const fn member_defaults() -> CapabilitySet {
        CapabilitySet::empty()
            .with(Capability::CreateThreads)
            .with(Capability::Reply)
    }

    #[must_use]
    pub fn to_names(self) -> Vec<&'static str> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.has(*c))
            .map(Capability::name)
            .collect()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_names().join(", "))
    }
}

impl From<CapabilitySet> for i64 {
    fn from(c: CapabilitySet) -> Self {
        i64::from(c.0)
    }
}

impl From<i64> for CapabilitySet {
    fn from(bits: i64) -> Self {
        Self::from_bits_truncate(bits as u32)
    }
}

// Wire form: {"can_manage_roles": true, "can_reply": false, ...}
impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Capability::ALL.len()))?;
        for capability in Capability::ALL {
            map.serialize_entry(capability.name(), &self.has(capability))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CapabilityMapVisitor;

        impl<'de> Visitor<'de> for CapabilityMapVisitor {
            type Value = CapabilitySet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of capability names to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CapabilitySet, A::Error> {
                let mut set = CapabilitySet::empty();
                while let Some((name, granted)) = access.next_entry::<String, bool>()? {
                    let capability = Capability::parse(&name).ok_or_else(|| {
                        de::Error::custom(format!("unknown capability: {name}"))
                    })?;
                    if granted {
                        set = set.with(capability);
                    }
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(CapabilityMapVisitor)
    }
}
