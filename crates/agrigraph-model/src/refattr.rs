//! Located-at relationship attributes.
//!
//! NGSI-LD models "located at" with a different attribute depending on what
//! the parent is: `refAgriFarm` for farms, `refAgriGreenhouse` for
//! greenhouses, and `refAgriParcel` for parcels and everything else. An
//! entity holds at most one of the three at a time; setting one must clear
//! the others.

use crate::entity::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the mutually exclusive located-at attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefAttribute {
    AgriParcel,
    AgriFarm,
    AgriGreenhouse,
}

impl RefAttribute {
    /// The full mutual-exclusivity set, in the order the boundary scans
    /// entities for a parent reference.
    pub const ALL: [Self; 3] = [Self::AgriParcel, Self::AgriFarm, Self::AgriGreenhouse];

    /// Wire name expected by the entity repository.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgriParcel => "refAgriParcel",
            Self::AgriFarm => "refAgriFarm",
            Self::AgriGreenhouse => "refAgriGreenhouse",
        }
    }

    /// Select the attribute that links a child to a parent of the given
    /// type. Total: anything that is not a farm or a greenhouse uses the
    /// parcel attribute.
    pub fn for_parent_type(parent_type: &EntityType) -> Self {
        match parent_type {
            EntityType::AgriFarm => Self::AgriFarm,
            EntityType::AgriGreenhouse => Self::AgriGreenhouse,
            _ => Self::AgriParcel,
        }
    }

    /// The other two attributes, the ones a patch must clear when setting
    /// `self`.
    pub fn competitors(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |attr| *attr != self)
    }
}

impl fmt::Display for RefAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_type_mapping_is_total() {
        assert_eq!(
            RefAttribute::for_parent_type(&EntityType::AgriFarm),
            RefAttribute::AgriFarm
        );
        assert_eq!(
            RefAttribute::for_parent_type(&EntityType::AgriGreenhouse),
            RefAttribute::AgriGreenhouse
        );
        // Parcels and arbitrary types both fall through to the default.
        assert_eq!(
            RefAttribute::for_parent_type(&EntityType::AgriParcel),
            RefAttribute::AgriParcel
        );
        assert_eq!(
            RefAttribute::for_parent_type(&EntityType::Other("Silo".into())),
            RefAttribute::AgriParcel
        );
    }

    #[test]
    fn competitors_exclude_self() {
        let cleared: Vec<_> = RefAttribute::AgriFarm.competitors().collect();
        assert_eq!(
            cleared,
            vec![RefAttribute::AgriParcel, RefAttribute::AgriGreenhouse]
        );
    }
}
