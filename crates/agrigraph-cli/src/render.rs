//! Terminal rendering for forests, listings, and counts.

use agrigraph_engine::tree::{Forest, TreeNode};
use agrigraph_engine::view::Counts;
use agrigraph_model::{Category, Entity, EntityStatus};
use colored::Colorize;

pub fn print_forest(forest: &Forest) {
    for root in &forest.roots {
        print_node(root, 0);
    }
    println!(
        "{} entities, {} roots, {} orphans",
        forest.len(),
        forest.roots.len(),
        forest.orphan_count
    );
}

fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{} {} {}",
        category_tag(node.entity.category()),
        node.entity.name.bold(),
        status_tag(node.entity.status)
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

pub fn print_listing(entities: &[Entity]) {
    for entity in entities {
        let municipality = entity.municipality.as_deref().unwrap_or("-");
        println!(
            "{} {} [{}] {} {}",
            category_tag(entity.category()),
            entity.name.bold(),
            entity.entity_type,
            municipality.dimmed(),
            status_tag(entity.status)
        );
    }
    println!("{} entities", entities.len());
}

pub fn print_counts(counts: &Counts) {
    println!("{}", "by category".underline());
    for (category, count) in &counts.by_category {
        println!("  {:<16} {count}", category.to_string());
    }
    println!("{}", "by type".underline());
    for (entity_type, count) in &counts.by_type {
        println!("  {:<16} {count}", entity_type.to_string());
    }
}

fn category_tag(category: Category) -> colored::ColoredString {
    let tag = format!("[{category}]");
    match category {
        Category::Parcels => tag.green(),
        Category::Sensors => tag.cyan(),
        Category::Fleet => tag.yellow(),
        Category::Water => tag.blue(),
        Category::Vegetation => tag.bright_green(),
        Category::Livestock => tag.magenta(),
        Category::Weather => tag.bright_blue(),
        Category::Infrastructure => tag.white(),
    }
}

fn status_tag(status: EntityStatus) -> colored::ColoredString {
    match status {
        EntityStatus::Active => status.to_string().green(),
        EntityStatus::Inactive | EntityStatus::Offline => status.to_string().dimmed(),
        EntityStatus::Maintenance => status.to_string().yellow(),
        EntityStatus::Error => status.to_string().red(),
        EntityStatus::Unknown => status.to_string().normal(),
    }
}
