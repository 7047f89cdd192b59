//! Filter/Sort Engine: explicit, immutable view state.
//!
//! Filters are conjunctive across dimensions and disjunctive within a
//! multi-select dimension; an empty selection means "no filter". Counts are
//! derived over the unfiltered catalog so the navigation pills always show
//! total inventory, not the current subset.

use crate::tree::name_order;
use agrigraph_model::{Catalog, Category, Entity, EntityStatus, EntityType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ============================================================================
// View State
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub filters: Filters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<EntityType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<EntityStatus>,
    /// Tri-state: `None` = no filter, otherwise exact match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_location: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    /// Case-insensitive substring over name, type, and municipality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn matches(&self, entity: &Entity) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&entity.category()) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&entity.entity_type) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&entity.status) {
            return false;
        }
        if let Some(wanted) = self.has_location {
            if entity.has_location != wanted {
                return false;
            }
        }
        if let Some(municipality) = &self.municipality {
            if entity.municipality.as_deref() != Some(municipality.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let mut haystacks = [
                Some(entity.name.as_str()),
                Some(entity.entity_type.as_str()),
                entity.municipality.as_deref(),
            ]
            .into_iter()
            .flatten();
            if !haystacks.any(|hay| hay.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// Sort
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Type,
    Status,
    Municipality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Header-click behavior: same field flips direction, a new field
    /// resets to ascending.
    pub fn toggle(current: Option<Sort>, field: SortField) -> Sort {
        match current {
            Some(sort) if sort.field == field => Sort {
                field,
                direction: match sort.direction {
                    SortDirection::Ascending => SortDirection::Descending,
                    SortDirection::Descending => SortDirection::Ascending,
                },
            },
            _ => Sort::ascending(field),
        }
    }

    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ordering = match self.field {
            SortField::Name => name_order(&a.name, &b.name),
            SortField::Type => a.entity_type.as_str().cmp(b.entity_type.as_str()),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::Municipality => a
                .municipality
                .as_deref()
                .unwrap_or("")
                .cmp(b.municipality.as_deref().unwrap_or("")),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

// ============================================================================
// Derivations
// ============================================================================

/// Filtered view of a catalog, in original relative order.
pub fn apply_filters(catalog: &Catalog, filters: &Filters) -> Vec<Entity> {
    catalog
        .iter()
        .filter(|entity| filters.matches(entity))
        .cloned()
        .collect()
}

/// Stable sort by the active key.
pub fn apply_sort(mut entities: Vec<Entity>, sort: &Sort) -> Vec<Entity> {
    entities.sort_by(|a, b| sort.compare(a, b));
    entities
}

/// Inventory counts, always over the unfiltered catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Counts {
    pub by_category: BTreeMap<Category, usize>,
    pub by_type: BTreeMap<EntityType, usize>,
}

pub fn derive_counts(catalog: &Catalog) -> Counts {
    let mut counts = Counts::default();
    for entity in catalog.iter() {
        *counts.by_category.entry(entity.category()).or_default() += 1;
        *counts
            .by_type
            .entry(entity.entity_type.clone())
            .or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrigraph_model::EntityId;

    fn entity(id: &str, ty: EntityType, name: &str, status: EntityStatus) -> Entity {
        Entity {
            id: EntityId::new(id),
            entity_type: ty,
            name: name.to_string(),
            parent_id: None,
            municipality: Some("Murcia".to_string()),
            status,
            has_location: false,
        }
    }

    fn five_entities() -> Catalog {
        Catalog::new(vec![
            entity("1", EntityType::AgriParcel, "North", EntityStatus::Active),
            entity("2", EntityType::AgriSensor, "Soil-1", EntityStatus::Offline),
            entity("3", EntityType::AgriSensor, "Soil-2", EntityStatus::Active),
            entity("4", EntityType::Device, "Gate", EntityStatus::Error),
            entity("5", EntityType::Vehicle, "Tractor", EntityStatus::Inactive),
        ])
    }

    #[test]
    fn status_filter_keeps_original_order() {
        let filters = Filters {
            statuses: vec![EntityStatus::Active],
            ..Filters::default()
        };
        let result = apply_filters(&five_entities(), &filters);
        let ids: Vec<_> = result.iter().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn empty_multi_select_means_no_filter() {
        let result = apply_filters(&five_entities(), &Filters::default());
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn dimensions_combine_conjunctively() {
        let filters = Filters {
            types: vec![EntityType::AgriSensor, EntityType::Device],
            statuses: vec![EntityStatus::Active],
            ..Filters::default()
        };
        let result = apply_filters(&five_entities(), &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Soil-2");
    }

    #[test]
    fn location_filter_is_tri_state() {
        let mut catalog_entities = vec![
            entity("1", EntityType::AgriSensor, "a", EntityStatus::Active),
            entity("2", EntityType::AgriSensor, "b", EntityStatus::Active),
        ];
        catalog_entities[0].has_location = true;
        let catalog = Catalog::new(catalog_entities);

        let none = Filters::default();
        assert_eq!(apply_filters(&catalog, &none).len(), 2);

        let with = Filters {
            has_location: Some(true),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&catalog, &with).len(), 1);

        let without = Filters {
            has_location: Some(false),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&catalog, &without)[0].name, "b");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filters = Filters {
            search: Some("soil".to_string()),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&five_entities(), &filters).len(), 2);

        // Matches the type column too.
        let filters = Filters {
            search: Some("vehic".to_string()),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&five_entities(), &filters).len(), 1);

        // And the municipality.
        let filters = Filters {
            search: Some("murc".to_string()),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&five_entities(), &filters).len(), 5);
    }

    #[test]
    fn default_view_state_is_unfiltered() {
        let view = ViewState::default();
        assert!(view.filters.is_empty());
        assert!(view.sort.is_none());
    }

    #[test]
    fn toggle_flips_then_resets() {
        let first = Sort::toggle(None, SortField::Name);
        assert_eq!(first, Sort::ascending(SortField::Name));

        let flipped = Sort::toggle(Some(first), SortField::Name);
        assert_eq!(flipped.direction, SortDirection::Descending);

        let reset = Sort::toggle(Some(flipped), SortField::Status);
        assert_eq!(reset, Sort::ascending(SortField::Status));
    }

    #[test]
    fn sort_is_deterministic() {
        let sort = Sort::ascending(SortField::Name);
        let once = apply_sort(apply_filters(&five_entities(), &Filters::default()), &sort);
        let twice = apply_sort(once.clone(), &sort);
        assert_eq!(once, twice);
    }

    #[test]
    fn counts_cover_the_unfiltered_catalog() {
        let counts = derive_counts(&five_entities());
        assert_eq!(counts.by_category[&Category::Parcels], 1);
        assert_eq!(counts.by_category[&Category::Sensors], 3);
        assert_eq!(counts.by_category[&Category::Fleet], 1);
        assert_eq!(counts.by_type[&EntityType::AgriSensor], 2);
        assert_eq!(counts.by_type[&EntityType::Device], 1);
    }
}
