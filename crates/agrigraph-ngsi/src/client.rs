//! Orion-LD client.
//!
//! Implements the engine's repository ports against an NGSI-LD context
//! broker. Dependency counting fans out one query per candidate and
//! located-at attribute, then aggregates the dependents per type; the
//! fan-out is invisible to callers, who see one batched result.

use crate::codec::{decode_entities, encode_relationship_patch};
use crate::error::NgsiError;
use agrigraph_engine::relation::RelationshipPatch;
use agrigraph_engine::repo::{DependencyQueryService, EntityRepository, RepoError};
use agrigraph_model::{Dependency, Entity, EntityId, EntityType, RefAttribute};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Page size for entity listings. Orion-LD caps single responses, so the
/// client pages until a short page comes back.
const PAGE_LIMIT: usize = 1000;

const TENANT_HEADER: &str = "NGSILD-Tenant";

pub struct OrionClient {
    http: reqwest::Client,
    base: Url,
    tenant: Option<String>,
}

impl OrionClient {
    pub fn new(base_url: &str, tenant: Option<String>) -> Result<Self, NgsiError> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            tenant,
        })
    }

    fn entities_url(&self) -> Result<Url, NgsiError> {
        Ok(self.base.join("/ngsi-ld/v1/entities")?)
    }

    fn entity_url(&self, id: &EntityId, suffix: &str) -> Result<Url, NgsiError> {
        self.base
            .join(&format!("/ngsi-ld/v1/entities/{}{suffix}", id.as_str()))
            .map_err(NgsiError::from)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(tenant) = &self.tenant {
            if let Ok(value) = HeaderValue::from_str(tenant) {
                headers.insert(TENANT_HEADER, value);
            }
        }
        headers
    }

    async fn get_entities(&self, query: &[(&str, String)]) -> Result<Vec<Entity>, NgsiError> {
        let response = self
            .http
            .get(self.entities_url()?)
            .headers(self.headers())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body: Value = if status.is_success() {
            response.json().await?
        } else {
            return Err(broker_error(status, response.text().await.ok()));
        };
        decode_entities(&body)
    }

    /// Entities of any type referencing `parent` through `attribute`.
    async fn dependents_of(
        &self,
        parent: &EntityId,
        attribute: RefAttribute,
    ) -> Result<Vec<Entity>, NgsiError> {
        self.get_entities(&[
            ("q", format!("{}==\"{}\"", attribute.as_str(), parent.as_str())),
            ("options", "keyValues".to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ])
        .await
    }
}

fn broker_error(status: StatusCode, body: Option<String>) -> NgsiError {
    NgsiError::Broker {
        status: status.as_u16(),
        detail: body.unwrap_or_default(),
    }
}

#[async_trait]
impl EntityRepository for OrionClient {
    async fn list_entities(&self) -> Result<Vec<Entity>, RepoError> {
        let mut entities = Vec::new();
        let mut offset = 0usize;
        loop {
            let page = self
                .get_entities(&[
                    ("local", "true".to_string()),
                    ("options", "keyValues".to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                    ("offset", offset.to_string()),
                ])
                .await
                .map_err(RepoError::from)?;
            let short_page = page.len() < PAGE_LIMIT;
            offset += page.len();
            entities.extend(page);
            if short_page {
                break;
            }
        }
        tracing::debug!(count = entities.len(), "listed broker entities");
        Ok(entities)
    }

    async fn patch_entity(&self, patch: &RelationshipPatch) -> Result<(), RepoError> {
        let url = self
            .entity_url(&patch.entity_id, "/attrs")
            .map_err(RepoError::from)?;
        let response = self
            .http
            .patch(url)
            .headers(self.headers())
            .header(CONTENT_TYPE, "application/json")
            .json(&encode_relationship_patch(patch))
            .send()
            .await
            .map_err(|err| RepoError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RepoError::from(broker_error(status, Some(detail))));
        }
        Ok(())
    }

    async fn delete_entity(
        &self,
        _entity_type: &EntityType,
        id: &EntityId,
    ) -> Result<(), RepoError> {
        let url = self.entity_url(id, "").map_err(RepoError::from)?;
        let response = self
            .http
            .delete(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|err| RepoError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RepoError::from(broker_error(status, Some(detail))));
        }
        Ok(())
    }
}

#[async_trait]
impl DependencyQueryService for OrionClient {
    async fn batch_check_dependencies(
        &self,
        candidates: &[Entity],
    ) -> Result<Vec<Dependency>, RepoError> {
        let mut rows = Vec::new();
        for candidate in candidates {
            // (dependent type) -> count, aggregated across all three
            // located-at attributes.
            let mut per_type: BTreeMap<EntityType, u64> = BTreeMap::new();
            for attribute in RefAttribute::ALL {
                let dependents = self
                    .dependents_of(&candidate.id, attribute)
                    .await
                    .map_err(|err| RepoError::DependencyCheck(err.to_string()))?;
                for dependent in dependents {
                    *per_type.entry(dependent.entity_type).or_default() += 1;
                }
            }
            for (dependent_type, dependent_count) in per_type {
                rows.push(Dependency {
                    entity_name: candidate.name.clone(),
                    dependent_type,
                    dependent_count,
                });
            }
        }
        Ok(rows)
    }
}
