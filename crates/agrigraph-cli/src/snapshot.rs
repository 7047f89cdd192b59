//! Catalog snapshot loading.
//!
//! A snapshot file is a JSON array of entities, either in the flat model
//! shape this workspace serializes, or as raw NGSI-LD payloads (normalized
//! or keyValues). The loader tries the flat shape first and falls back to
//! the wire codec, so `agrigraph tree --snapshot export.json` works on
//! both console exports and broker dumps.

use agrigraph_model::{Catalog, Entity};
use agrigraph_ngsi::decode_entities;
use anyhow::{Context, Result};
use std::path::Path;

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    if let Ok(entities) = serde_json::from_value::<Vec<Entity>>(value.clone()) {
        tracing::debug!(count = entities.len(), "loaded flat snapshot");
        return Ok(Catalog::new(entities));
    }

    let entities = decode_entities(&value)
        .with_context(|| format!("decoding NGSI-LD snapshot {}", path.display()))?;
    tracing::debug!(count = entities.len(), "loaded NGSI-LD snapshot");
    Ok(Catalog::new(entities))
}
