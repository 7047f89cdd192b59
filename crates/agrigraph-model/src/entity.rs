//! Entities, types, categories, and statuses.
//!
//! `EntityType` is the closed-ish tag identifying an entity's concrete kind.
//! Unknown broker types round-trip through `Other` untouched so a newer
//! backend never breaks an older console. `Category` is the coarser grouping
//! used for navigation; it is *derived* from the type by an exhaustive match
//! so adding a new type is a compile-checked change.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque entity identifier.
///
/// In practice ids follow the NGSI-LD URN convention
/// `urn:ngsi-ld:<Type>:<tenant>:<local-id>`, but nothing in the engine
/// depends on that shape. The segment accessors below are display helpers
/// only and return `None` for non-URN ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type segment of an `urn:ngsi-ld:` id, if the id has one.
    pub fn type_hint(&self) -> Option<&str> {
        self.urn_segment(0)
    }

    /// Tenant segment of an `urn:ngsi-ld:` id, if the id has one.
    pub fn tenant(&self) -> Option<&str> {
        self.urn_segment(1)
    }

    fn urn_segment(&self, index: usize) -> Option<&str> {
        let rest = self.0.strip_prefix("urn:ngsi-ld:")?;
        let mut segments = rest.split(':');
        let segment = segments.nth(index)?;
        // The local-id segment must still be present for the id to be well formed.
        if index < 2 && segments.next().is_none() {
            return None;
        }
        Some(segment)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ============================================================================
// Types and Categories
// ============================================================================

/// Concrete entity kind.
///
/// The known variants cover the agricultural fleet this console manages;
/// `Other` carries any type string the broker sends that we do not model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    AgriParcel,
    AgriFarm,
    AgriGreenhouse,
    AgriSensor,
    AgriCrop,
    Animal,
    Device,
    Vehicle,
    WaterTank,
    WeatherStation,
    Other(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AgriParcel => "AgriParcel",
            Self::AgriFarm => "AgriFarm",
            Self::AgriGreenhouse => "AgriGreenhouse",
            Self::AgriSensor => "AgriSensor",
            Self::AgriCrop => "AgriCrop",
            Self::Animal => "Animal",
            Self::Device => "Device",
            Self::Vehicle => "Vehicle",
            Self::WaterTank => "WaterTank",
            Self::WeatherStation => "WeatherStation",
            Self::Other(name) => name,
        }
    }

    /// Navigation category for this type.
    ///
    /// Unknown types land in `Infrastructure`, the catch-all bucket the
    /// console renders with the generic icon.
    pub fn category(&self) -> Category {
        match self {
            Self::AgriParcel => Category::Parcels,
            Self::AgriSensor | Self::Device => Category::Sensors,
            Self::Vehicle => Category::Fleet,
            Self::AgriFarm | Self::AgriGreenhouse => Category::Infrastructure,
            Self::AgriCrop => Category::Vegetation,
            Self::Animal => Category::Livestock,
            Self::WaterTank => Category::Water,
            Self::WeatherStation => Category::Weather,
            Self::Other(_) => Category::Infrastructure,
        }
    }
}

impl From<&str> for EntityType {
    fn from(raw: &str) -> Self {
        match raw {
            "AgriParcel" => Self::AgriParcel,
            "AgriFarm" => Self::AgriFarm,
            "AgriGreenhouse" => Self::AgriGreenhouse,
            "AgriSensor" => Self::AgriSensor,
            "AgriCrop" => Self::AgriCrop,
            "Animal" => Self::Animal,
            "Device" => Self::Device,
            "Vehicle" => Self::Vehicle,
            "WaterTank" => Self::WaterTank,
            "WeatherStation" => Self::WeatherStation,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Types serialize as their wire name so snapshots and JSON map keys stay
// readable and stable across console versions.
impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Coarse navigation grouping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Parcels,
    Sensors,
    Fleet,
    Infrastructure,
    Vegetation,
    Livestock,
    Water,
    Weather,
}

impl Category {
    pub const ALL: [Self; 8] = [
        Self::Parcels,
        Self::Sensors,
        Self::Fleet,
        Self::Infrastructure,
        Self::Vegetation,
        Self::Livestock,
        Self::Water,
        Self::Weather,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parcels => "parcels",
            Self::Sensors => "sensors",
            Self::Fleet => "fleet",
            Self::Infrastructure => "infrastructure",
            Self::Vegetation => "vegetation",
            Self::Livestock => "livestock",
            Self::Water => "water",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == raw)
            .ok_or_else(|| ParseError::Category(raw.to_string()))
    }
}

// ============================================================================
// Status
// ============================================================================

/// Operational status reported by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Inactive,
    Maintenance,
    Error,
    Offline,
    #[default]
    Unknown,
}

impl EntityStatus {
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::Inactive,
        Self::Maintenance,
        Self::Error,
        Self::Offline,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
            Self::Error => "error",
            Self::Offline => "offline",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityStatus {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| ParseError::Status(raw.to_string()))
    }
}

/// Errors from parsing user-supplied vocabulary strings (CLI flags etc).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown category: {0}")]
    Category(String),
    #[error("unknown status: {0}")]
    Status(String),
}

// ============================================================================
// Entity
// ============================================================================

/// A managed entity, flattened from whatever shape the backend sent.
///
/// `parent_id` is the single source of hierarchy. It is derived at the
/// NGSI boundary from whichever of the located-at relationship attributes
/// is present; the engine never sees the raw attributes.
// `deny_unknown_fields` keeps this shape distinguishable from raw NGSI-LD
// payloads, which carry the ref attributes at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub has_location: bool,
}

impl Entity {
    pub fn category(&self) -> Category {
        self.entity_type.category()
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// One row of a dependency-check result: how many entities of
/// `dependent_type` reference the named candidate as their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub entity_name: String,
    pub dependent_type: EntityType,
    pub dependent_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_segments_resolve() {
        let id = EntityId::new("urn:ngsi-ld:AgriParcel:wine-coop:p-001");
        assert_eq!(id.type_hint(), Some("AgriParcel"));
        assert_eq!(id.tenant(), Some("wine-coop"));
    }

    #[test]
    fn non_urn_ids_have_no_segments() {
        let id = EntityId::new("parcel-7");
        assert_eq!(id.type_hint(), None);
        assert_eq!(id.tenant(), None);
    }

    #[test]
    fn unknown_types_round_trip() {
        let ty = EntityType::from("AgriPest");
        assert_eq!(ty, EntityType::Other("AgriPest".to_string()));
        assert_eq!(ty.as_str(), "AgriPest");

        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"AgriPest\"");
        let back: EntityType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn categories_cover_all_known_types() {
        assert_eq!(EntityType::AgriParcel.category(), Category::Parcels);
        assert_eq!(EntityType::AgriSensor.category(), Category::Sensors);
        assert_eq!(EntityType::Device.category(), Category::Sensors);
        assert_eq!(EntityType::Vehicle.category(), Category::Fleet);
        assert_eq!(EntityType::AgriFarm.category(), Category::Infrastructure);
        assert_eq!(EntityType::AgriCrop.category(), Category::Vegetation);
        assert_eq!(EntityType::Animal.category(), Category::Livestock);
        assert_eq!(EntityType::WaterTank.category(), Category::Water);
        assert_eq!(EntityType::WeatherStation.category(), Category::Weather);
    }

    #[test]
    fn status_defaults_to_unknown() {
        let entity: Entity = serde_json::from_str(
            r#"{"id":"urn:ngsi-ld:Device:acme:d-1","type":"Device","name":"Gate"}"#,
        )
        .unwrap();
        assert_eq!(entity.status, EntityStatus::Unknown);
        assert!(!entity.has_location);
        assert_eq!(entity.parent_id, None);
    }
}
