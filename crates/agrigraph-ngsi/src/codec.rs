//! NGSI-LD wire codec.
//!
//! Decoding accepts both the normalized form (attributes wrapped in
//! `{"type":"Property","value":...}` / `{"type":"Relationship","object":...}`)
//! and the compact `options=keyValues` form, because consoles routinely see
//! both depending on which query produced the payload. The parent reference
//! is taken from the first located-at attribute present, scanning in the
//! fixed parcel, farm, greenhouse order.
//!
//! Encoding produces the PATCH fragment for a relationship change: the
//! selected attribute as a `Relationship`, every competing attribute as
//! JSON `null` so the broker drops leftover state.

use crate::error::NgsiError;
use agrigraph_engine::relation::RelationshipPatch;
use agrigraph_model::{Entity, EntityId, EntityStatus, EntityType, RefAttribute};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Decode one broker entity.
pub fn decode_entity(raw: &Value) -> Result<Entity, NgsiError> {
    let object = raw
        .as_object()
        .ok_or_else(|| NgsiError::Decode("entity is not a JSON object".to_string()))?;

    let id = required_str(object, "id")?;
    let entity_type = EntityType::from(required_str(object, "type")?);

    let name = attr_str(object, "name")
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());

    // Prefer a flat municipality property, fall back to the schema.org
    // style address block.
    let municipality = attr_str(object, "municipality")
        .map(str::to_string)
        .or_else(|| {
            object
                .get("address")
                .map(unwrap_attr)
                .and_then(|addr| addr.get("addressLocality"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    // Unknown status strings degrade to Unknown instead of failing the
    // whole listing.
    let status = attr_str(object, "status")
        .and_then(|raw_status| raw_status.parse::<EntityStatus>().ok())
        .unwrap_or_default();

    let has_location = object
        .get("location")
        .is_some_and(|location| !location.is_null());

    let parent_id = RefAttribute::ALL
        .iter()
        .find_map(|attr| relationship_object(object, attr.as_str()))
        .map(EntityId::new);

    Ok(Entity {
        id: EntityId::new(id),
        entity_type,
        name,
        parent_id,
        municipality,
        status,
        has_location,
    })
}

/// Decode a broker listing, skipping malformed rows with a warning rather
/// than failing the whole snapshot.
pub fn decode_entities(raw: &Value) -> Result<Vec<Entity>, NgsiError> {
    let rows = raw
        .as_array()
        .ok_or_else(|| NgsiError::Decode("listing is not a JSON array".to_string()))?;

    let mut entities = Vec::with_capacity(rows.len());
    for row in rows {
        match decode_entity(row) {
            Ok(entity) => entities.push(entity),
            Err(err) => {
                tracing::warn!(%err, "skipping undecodable entity row");
            }
        }
    }
    Ok(entities)
}

/// Encode a relationship patch as the body of a single
/// `PATCH /entities/{id}/attrs` request.
pub fn encode_relationship_patch(patch: &RelationshipPatch) -> Value {
    let mut fragment = Map::new();

    if let Some((attribute, parent_id)) = &patch.set {
        fragment.insert(
            attribute.as_str().to_string(),
            json!({
                "type": "Relationship",
                "object": parent_id.as_str(),
                "observedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        );
    }
    for attribute in &patch.clear {
        fragment.insert(attribute.as_str().to_string(), Value::Null);
    }

    Value::Object(fragment)
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, NgsiError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| NgsiError::Decode(format!("missing or non-string '{key}'")))
}

/// Normalized attributes carry the payload under `value` or `object`;
/// keyValues payloads are the value itself.
fn unwrap_attr(attr: &Value) -> &Value {
    if let Some(wrapped) = attr.get("value").or_else(|| attr.get("object")) {
        wrapped
    } else {
        attr
    }
}

fn attr_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).map(unwrap_attr).and_then(Value::as_str)
}

fn relationship_object<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    let attr = object.get(key)?;
    if attr.is_null() {
        return None;
    }
    unwrap_attr(attr).as_str()
}
