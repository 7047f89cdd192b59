//! Tree Builder: flat catalog to sorted forest.
//!
//! Two passes, O(n): allocate one node per entity in an arena keyed by id,
//! then attach each node to its parent or demote it to root when the parent
//! id does not resolve in this snapshot. Unresolved parents are a tolerance
//! policy, not an error; catalogs are frequently partial (filtered views).

use agrigraph_model::{Catalog, Category, Entity, EntityId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One node of the rendered forest.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub entity: Entity,
    pub children: Vec<TreeNode>,
}

/// The full derived structure: disjoint trees plus the orphan tally.
#[derive(Debug, Clone, Serialize)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    /// Non-parcel roots with no resolvable parent in this snapshot.
    /// Reporting only; an orphan is not a correctness error.
    pub orphan_count: usize,
}

impl Forest {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total entities in the forest.
    pub fn len(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }
}

/// Build the sorted forest for one catalog snapshot.
///
/// Never fails. A `parent_id` that does not resolve in the snapshot,
/// including a self-reference, demotes the node to root.
pub fn build_forest(catalog: &Catalog) -> Forest {
    // Pass 1: one child bucket per entity, keyed by id. The arena owns all
    // intermediate state until the roots are assembled.
    let mut children: HashMap<&EntityId, Vec<&Entity>> = HashMap::with_capacity(catalog.len());
    for entity in catalog.iter() {
        children.entry(&entity.id).or_default();
    }

    // Pass 2: attach to parent or demote to root.
    let mut root_entities: Vec<&Entity> = Vec::new();
    let mut orphan_count = 0usize;
    for entity in catalog.iter() {
        let resolved_parent = entity
            .parent_id
            .as_ref()
            .filter(|parent| *parent != &entity.id)
            .and_then(|parent| catalog.get(parent));

        match resolved_parent {
            // The arena holds a bucket for every catalog id, so a resolved
            // parent always has one.
            Some(parent) => {
                if let Some(bucket) = children.get_mut(&parent.id) {
                    bucket.push(entity);
                }
            }
            None => {
                if entity.parent_id.is_some() {
                    tracing::warn!(
                        entity = %entity.id,
                        parent = ?entity.parent_id,
                        "parent not resolvable in snapshot, demoting to root"
                    );
                }
                if entity.category() != Category::Parcels {
                    orphan_count += 1;
                }
                root_entities.push(entity);
            }
        }
    }

    let mut roots: Vec<TreeNode> = root_entities
        .into_iter()
        .map(|entity| assemble(entity, &children))
        .collect();
    sort_level(&mut roots);

    tracing::debug!(
        entities = catalog.len(),
        roots = roots.len(),
        orphans = orphan_count,
        "forest built"
    );

    Forest { roots, orphan_count }
}

fn assemble(entity: &Entity, children: &HashMap<&EntityId, Vec<&Entity>>) -> TreeNode {
    let mut child_nodes: Vec<TreeNode> = children
        .get(&entity.id)
        .map(|bucket| {
            bucket
                .iter()
                .map(|child| assemble(child, children))
                .collect()
        })
        .unwrap_or_default();
    sort_level(&mut child_nodes);
    TreeNode {
        entity: entity.clone(),
        children: child_nodes,
    }
}

/// Level ordering: parcels first, then case-aware lexicographic name.
fn sort_level(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| sibling_order(&a.entity, &b.entity));
}

pub(crate) fn sibling_order(a: &Entity, b: &Entity) -> Ordering {
    let a_parcel = a.category() == Category::Parcels;
    let b_parcel = b.category() == Category::Parcels;
    b_parcel
        .cmp(&a_parcel)
        .then_with(|| name_order(&a.name, &b.name))
}

/// Case-aware name comparison: case-insensitive first, exact spelling as
/// the tie break so the order is total and stable across rebuilds.
pub(crate) fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrigraph_model::{EntityStatus, EntityType};

    fn entity(id: &str, ty: EntityType, name: &str, parent: Option<&str>) -> Entity {
        Entity {
            id: EntityId::new(id),
            entity_type: ty,
            name: name.to_string(),
            parent_id: parent.map(EntityId::new),
            municipality: None,
            status: EntityStatus::Active,
            has_location: false,
        }
    }

    #[test]
    fn parcel_with_child_sensor() {
        let catalog = Catalog::new(vec![
            entity("P1", EntityType::AgriParcel, "North Field", None),
            entity("S1", EntityType::AgriSensor, "Soil-1", Some("P1")),
        ]);
        let forest = build_forest(&catalog);

        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].entity.id.as_str(), "P1");
        assert_eq!(forest.roots[0].children.len(), 1);
        assert_eq!(forest.roots[0].children[0].entity.id.as_str(), "S1");
        assert_eq!(forest.orphan_count, 0);
    }

    #[test]
    fn unresolved_parent_demotes_to_root() {
        let catalog = Catalog::new(vec![entity(
            "S2",
            EntityType::AgriSensor,
            "Soil-2",
            Some("P9"),
        )]);
        let forest = build_forest(&catalog);

        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].entity.id.as_str(), "S2");
        assert_eq!(forest.orphan_count, 1);
    }

    #[test]
    fn self_reference_demotes_to_root() {
        let catalog = Catalog::new(vec![entity(
            "S3",
            EntityType::AgriSensor,
            "Loop",
            Some("S3"),
        )]);
        let forest = build_forest(&catalog);
        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.orphan_count, 1);
    }

    #[test]
    fn parcel_roots_are_not_orphans() {
        let catalog = Catalog::new(vec![
            entity("P1", EntityType::AgriParcel, "Field", None),
            entity("V1", EntityType::Vehicle, "Tractor", None),
        ]);
        let forest = build_forest(&catalog);
        assert_eq!(forest.orphan_count, 1);
    }

    #[test]
    fn parcels_sort_before_non_parcels_at_every_level() {
        let catalog = Catalog::new(vec![
            entity("F1", EntityType::AgriFarm, "Aardvark Farm", None),
            entity("P1", EntityType::AgriParcel, "Zulu Field", None),
            entity("S1", EntityType::AgriSensor, "alpha", Some("P1")),
            entity("P2", EntityType::AgriParcel, "sub parcel", Some("P1")),
        ]);
        let forest = build_forest(&catalog);

        // Parcel root first despite the farm sorting earlier by name.
        assert_eq!(forest.roots[0].entity.id.as_str(), "P1");
        assert_eq!(forest.roots[1].entity.id.as_str(), "F1");
        // Same rule inside the subtree.
        let children = &forest.roots[0].children;
        assert_eq!(children[0].entity.id.as_str(), "P2");
        assert_eq!(children[1].entity.id.as_str(), "S1");
    }

    #[test]
    fn name_order_is_case_aware() {
        assert_eq!(name_order("alpha", "Beta"), Ordering::Less);
        assert_eq!(name_order("Beta", "alpha"), Ordering::Greater);
        // Same letters, different case: exact spelling breaks the tie.
        assert_eq!(name_order("Soil", "soil"), Ordering::Less);
    }

    #[test]
    fn every_entity_appears_exactly_once() {
        let catalog = Catalog::new(vec![
            entity("P1", EntityType::AgriParcel, "Field", None),
            entity("S1", EntityType::AgriSensor, "a", Some("P1")),
            entity("S2", EntityType::AgriSensor, "b", Some("P1")),
            entity("S3", EntityType::AgriSensor, "c", Some("missing")),
        ]);
        let forest = build_forest(&catalog);
        assert_eq!(forest.len(), 4);
    }
}
