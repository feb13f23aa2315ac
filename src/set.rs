//! Permission sets as bitmasks
//!
//! One set per role: a mapping from flag to allowed/denied, packed into a
//! `u64` mask. On the wire a set is a JSON object with one boolean per flag
//! name; missing flags default to denied, unknown flag names are rejected.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::flags::{PermissionFlag, ALL_FLAGS, FLAG_COUNT};

/// Mask with every flag bit set
const FULL_MASK: u64 = (1 << FLAG_COUNT as u64) - 1;

/// A role's permission flags, packed into a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet(u64);

impl PermissionSet {
    /// All flags denied
    #[inline]
    pub const fn empty() -> Self {
        PermissionSet(0)
    }

    /// All flags allowed
    #[inline]
    pub const fn all() -> Self {
        PermissionSet(FULL_MASK)
    }

    /// Build from a raw mask, discarding unknown bits
    #[inline]
    pub const fn from_mask(mask: u64) -> Self {
        PermissionSet(mask & FULL_MASK)
    }

    /// The raw bitmask (for storage)
    #[inline]
    pub const fn mask(self) -> u64 {
        self.0
    }

    /// Build from a list of allowed flags
    pub fn from_flags(flags: &[PermissionFlag]) -> Self {
        flags.iter().copied().collect()
    }

    /// Whether a flag is allowed
    #[inline]
    pub const fn allows(self, flag: PermissionFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Whether any of the given flags is allowed
    pub fn allows_any(self, flags: &[PermissionFlag]) -> bool {
        flags.iter().any(|&f| self.allows(f))
    }

    /// Whether all of the given flags are allowed
    pub fn allows_all(self, flags: &[PermissionFlag]) -> bool {
        flags.iter().all(|&f| self.allows(f))
    }

    /// Set a flag to the given value in place
    #[inline]
    pub fn set(&mut self, flag: PermissionFlag, value: bool) {
        if value {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }

    /// Copy with one flag set to the given value
    #[inline]
    #[must_use]
    pub fn with(mut self, flag: PermissionFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Number of allowed flags
    #[inline]
    pub const fn allowed_count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Allowed flags in workflow order
    pub fn allowed(self) -> Vec<PermissionFlag> {
        ALL_FLAGS.into_iter().filter(|f| self.allows(*f)).collect()
    }
}

impl FromIterator<PermissionFlag> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = PermissionFlag>>(iter: I) -> Self {
        let mut set = PermissionSet::empty();
        for flag in iter {
            set.set(flag, true);
        }
        set
    }
}

impl std::fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for flag in self.allowed() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(flag.name())?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FLAG_COUNT))?;
        for flag in ALL_FLAGS {
            map.serialize_entry(flag.name(), &self.allows(flag))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = PermissionSet;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of permission flag names to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut set = PermissionSet::empty();
                while let Some((name, value)) = map.next_entry::<String, bool>()? {
                    let flag = PermissionFlag::from_name(&name).ok_or_else(|| {
                        de::Error::custom(format!("unknown permission flag: {}", name))
                    })?;
                    set.set(flag, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}
