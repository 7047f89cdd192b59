//! Agrigraph CLI
//!
//! Console-side tooling over the hierarchy engine:
//! - Render the parent/child forest for a catalog snapshot or live broker
//! - Inventory counts and filtered listings
//! - Dry-run (or apply) relationship changes as NGSI-LD patches
//! - Dependency-check deletion candidates before anything destructive

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use agrigraph_engine::deps::{check_dependencies, should_block_deletion};
use agrigraph_engine::relation::{plan_relationship_change, RelationshipPlan};
use agrigraph_engine::repo::{DependencyQueryService, RepoError};
use agrigraph_engine::tree::build_forest;
use agrigraph_engine::view::{
    apply_filters, apply_sort, derive_counts, Filters, Sort, SortField, ViewState,
};
use agrigraph_model::{
    Catalog, Category, Dependency, Entity, EntityId, EntityStatus, EntityType,
};
use agrigraph_ngsi::encode_relationship_patch;
use async_trait::async_trait;

mod render;
mod snapshot;

#[derive(Parser)]
#[command(name = "agrigraph")]
#[command(author, version, about = "Agrigraph: agricultural entity hierarchy console")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the catalog comes from.
#[derive(Args)]
struct Source {
    /// Catalog snapshot: JSON array of entities (flat or NGSI-LD)
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// NGSI-LD broker base URL (requires a build with the `orion` feature)
    #[arg(long, value_name = "URL")]
    broker: Option<String>,

    /// NGSILD-Tenant header for broker requests
    #[arg(long)]
    tenant: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sorted parent/child forest.
    Tree {
        #[command(flatten)]
        source: Source,
    },

    /// Inventory counts by category and type (always unfiltered).
    Counts {
        #[command(flatten)]
        source: Source,
    },

    /// Filtered, optionally sorted entity listing.
    List {
        #[command(flatten)]
        source: Source,

        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<String>,

        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,

        #[arg(long = "status", value_name = "STATUS")]
        statuses: Vec<String>,

        /// Tri-state location filter; omit for no filter
        #[arg(long, value_name = "BOOL")]
        has_location: Option<bool>,

        #[arg(long)]
        municipality: Option<String>,

        /// Case-insensitive substring over name, type, municipality
        #[arg(long)]
        search: Option<String>,

        /// Sort field: name, type, status, municipality
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, requires = "sort")]
        desc: bool,

        /// Emit JSON instead of the colored listing
        #[arg(long)]
        json: bool,
    },

    /// Plan a relationship change; print the NGSI-LD patch fragment.
    Relate {
        #[command(flatten)]
        source: Source,

        /// Child entity id
        child: String,

        /// New parent entity id
        #[arg(long, conflicts_with = "remove")]
        parent: Option<String>,

        /// Remove the relationship entirely
        #[arg(long)]
        remove: bool,

        /// Apply the patch through the broker instead of dry-running
        #[arg(long)]
        apply: bool,
    },

    /// Dependency-check deletion candidates and print the verdict.
    CheckDelete {
        #[command(flatten)]
        source: Source,

        /// Candidate entity ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Tree { source } => {
            let catalog = load_catalog(&source).await?;
            render::print_forest(&build_forest(&catalog));
        }

        Commands::Counts { source } => {
            let catalog = load_catalog(&source).await?;
            render::print_counts(&derive_counts(&catalog));
        }

        Commands::List {
            source,
            categories,
            types,
            statuses,
            has_location,
            municipality,
            search,
            sort,
            desc,
            json,
        } => {
            let catalog = load_catalog(&source).await?;
            let view = ViewState {
                filters: Filters {
                    categories: categories
                        .iter()
                        .map(|raw| raw.parse::<Category>())
                        .collect::<Result<_, _>>()?,
                    types: types.iter().map(|raw| EntityType::from(raw.as_str())).collect(),
                    statuses: statuses
                        .iter()
                        .map(|raw| raw.parse::<EntityStatus>())
                        .collect::<Result<_, _>>()?,
                    has_location,
                    municipality,
                    search,
                },
                sort: match sort.as_deref() {
                    Some(field) => {
                        let ascending = Sort::ascending(parse_sort_field(field)?);
                        Some(if desc {
                            Sort::toggle(Some(ascending), ascending.field)
                        } else {
                            ascending
                        })
                    }
                    None => None,
                },
            };

            let mut entities = apply_filters(&catalog, &view.filters);
            if let Some(sort) = &view.sort {
                entities = apply_sort(entities, sort);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&entities)?);
            } else {
                render::print_listing(&entities);
            }
        }

        Commands::Relate {
            source,
            child,
            parent,
            remove,
            apply,
        } => {
            if parent.is_none() && !remove {
                bail!("provide --parent <ID> or --remove");
            }
            let catalog = load_catalog(&source).await?;
            let child_id = EntityId::new(child);
            let child = catalog
                .get(&child_id)
                .with_context(|| format!("child {child_id} not in catalog"))?;
            let parent_id = parent.map(EntityId::new);

            let plan = plan_relationship_change(child, parent_id.as_ref(), &catalog)?;
            match plan {
                RelationshipPlan::NoOp => {
                    println!("{}", "no change: already the current parent".dimmed());
                }
                RelationshipPlan::Patch(ref patch) => {
                    let mode = if apply { "(applying)" } else { "(dry run)" };
                    println!(
                        "{} {} {}",
                        "patch for".bold(),
                        patch.entity_id,
                        mode.dimmed()
                    );
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&encode_relationship_patch(patch))?
                    );
                    if apply {
                        apply_patch(&source, child, parent_id.as_ref(), &catalog).await?;
                    }
                }
            }
        }

        Commands::CheckDelete { source, ids } => {
            let catalog = load_catalog(&source).await?;
            let mut candidates = Vec::with_capacity(ids.len());
            for id in ids {
                let id = EntityId::new(id);
                let entity = catalog
                    .get(&id)
                    .with_context(|| format!("candidate {id} not in catalog"))?;
                candidates.push(entity.clone());
            }

            let service = dependency_service(&source, &catalog)?;
            let records = check_dependencies(&candidates, service.as_ref()).await?;

            if should_block_deletion(&records) {
                println!("{}", "deletion BLOCKED".red().bold());
                for row in records.iter().filter(|row| row.dependent_count > 0) {
                    println!(
                        "  {} is referenced by {} {} entities",
                        row.entity_name.bold(),
                        row.dependent_count,
                        row.dependent_type
                    );
                }
            } else {
                println!("{}", "deletion allowed: no dependents".green());
            }
        }
    }

    Ok(())
}

fn parse_sort_field(raw: &str) -> Result<SortField> {
    Ok(match raw {
        "name" => SortField::Name,
        "type" => SortField::Type,
        "status" => SortField::Status,
        "municipality" => SortField::Municipality,
        other => bail!("unknown sort field: {other}"),
    })
}

async fn load_catalog(source: &Source) -> Result<Catalog> {
    match (&source.broker, &source.snapshot) {
        (Some(broker), _) => load_from_broker(broker, source.tenant.clone()).await,
        (None, Some(path)) => snapshot::load_catalog(path),
        (None, None) => bail!("provide --snapshot <FILE> or --broker <URL>"),
    }
}

#[cfg(feature = "orion")]
async fn load_from_broker(broker: &str, tenant: Option<String>) -> Result<Catalog> {
    use agrigraph_engine::repo::EntityRepository;
    let client = agrigraph_ngsi::OrionClient::new(broker, tenant)?;
    Ok(Catalog::new(client.list_entities().await?))
}

#[cfg(not(feature = "orion"))]
async fn load_from_broker(_broker: &str, _tenant: Option<String>) -> Result<Catalog> {
    bail!("this build has no broker support; rebuild with --features orion or use --snapshot")
}

#[cfg(feature = "orion")]
async fn apply_patch(
    source: &Source,
    child: &Entity,
    parent: Option<&EntityId>,
    catalog: &Catalog,
) -> Result<()> {
    use agrigraph_engine::actions::apply_relationship_change;
    use agrigraph_engine::{EngineEvent, EventHandler};

    let Some(broker) = &source.broker else {
        bail!("--apply needs --broker <URL>");
    };
    let client = agrigraph_ngsi::OrionClient::new(broker, source.tenant.clone())?;
    let handler: EventHandler = Box::new(|event| {
        if let EngineEvent::RelationshipChanged { entity_id } = event {
            println!("{} {entity_id}", "relationship changed:".green());
        }
    });
    apply_relationship_change(child, parent, catalog, &client, Some(&handler)).await?;
    Ok(())
}

#[cfg(not(feature = "orion"))]
async fn apply_patch(
    _source: &Source,
    _child: &Entity,
    _parent: Option<&EntityId>,
    _catalog: &Catalog,
) -> Result<()> {
    bail!("this build has no broker support; rebuild with --features orion to apply patches")
}

/// Pick the dependency service: live broker when configured, otherwise a
/// snapshot-local count of entities referencing each candidate as parent.
fn dependency_service(
    source: &Source,
    catalog: &Catalog,
) -> Result<Box<dyn DependencyQueryService>> {
    match &source.broker {
        Some(broker) => broker_dependency_service(broker, source.tenant.clone()),
        None => Ok(Box::new(SnapshotDependencies {
            catalog: catalog.clone(),
        })),
    }
}

#[cfg(feature = "orion")]
fn broker_dependency_service(
    broker: &str,
    tenant: Option<String>,
) -> Result<Box<dyn DependencyQueryService>> {
    Ok(Box::new(agrigraph_ngsi::OrionClient::new(broker, tenant)?))
}

#[cfg(not(feature = "orion"))]
fn broker_dependency_service(
    _broker: &str,
    _tenant: Option<String>,
) -> Result<Box<dyn DependencyQueryService>> {
    bail!("this build has no broker support; rebuild with --features orion")
}

/// Offline dependency counting: what in this snapshot points at the
/// candidate? Counts only what the snapshot contains, which is exactly
/// what an offline verdict can promise.
struct SnapshotDependencies {
    catalog: Catalog,
}

#[async_trait]
impl DependencyQueryService for SnapshotDependencies {
    async fn batch_check_dependencies(
        &self,
        candidates: &[Entity],
    ) -> Result<Vec<Dependency>, RepoError> {
        let mut rows = Vec::new();
        for candidate in candidates {
            let mut per_type: BTreeMap<EntityType, u64> = BTreeMap::new();
            for entity in self.catalog.iter() {
                if entity.parent_id.as_ref() == Some(&candidate.id) {
                    *per_type.entry(entity.entity_type.clone()).or_default() += 1;
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
