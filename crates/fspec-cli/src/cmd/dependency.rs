use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use fspec_core::types::RelationKind;
use fspec_core::workunit::WorkUnitsData;
use fspec_core::{graph, ProjectContext};
use std::path::Path;
use std::str::FromStr;

#[derive(Subcommand)]
pub enum DependencySubcommand {
    /// Add a relationship (blocks, blocked-by, depends-on, relates-to)
    Add {
        id: String,
        kind: String,
        target: String,
    },
    /// Remove a relationship and its mirror
    Remove {
        id: String,
        kind: String,
        target: String,
    },
}

pub fn run(root: &Path, subcmd: DependencySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DependencySubcommand::Add { id, kind, target } => add(root, &id, &kind, &target, json),
        DependencySubcommand::Remove { id, kind, target } => {
            remove(root, &id, &kind, &target, json)
        }
    }
}

fn add(root: &Path, id: &str, kind: &str, target: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let kind = RelationKind::from_str(kind)?;
    let mut data = WorkUnitsData::load(&ctx)?;
    let changed = graph::add_relation(&mut data, id, kind, target)
        .with_context(|| format!("cannot add {id} {kind} {target}"))?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({
            "id": id, "kind": kind.as_str(), "target": target, "changed": changed,
        }))?;
    } else if changed {
        println!("{id} {kind} {target}");
    } else {
        println!("{id} {kind} {target} (already present)");
    }
    Ok(())
}

fn remove(root: &Path, id: &str, kind: &str, target: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let kind = RelationKind::from_str(kind)?;
    let mut data = WorkUnitsData::load(&ctx)?;
    let changed = graph::remove_relation(&mut data, id, kind, target)?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({
            "id": id, "kind": kind.as_str(), "target": target, "changed": changed,
        }))?;
    } else if changed {
        println!("Removed {id} {kind} {target}");
    } else {
        println!("{id} {kind} {target} was not present");
    }
    Ok(())
}
