use crate::output::print_json;
use anyhow::Context;
use fspec_core::graph::{self, RepairAction};
use fspec_core::workunit::WorkUnitsData;
use fspec_core::ProjectContext;
use std::path::Path;

/// Re-derive the denormalized state index and relationship mirrors, dropping
/// edges that point at units that no longer exist. Writes only when something
/// actually changed.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut data = WorkUnitsData::load(&ctx)?;
    let actions = graph::repair(&mut data);

    if !actions.is_empty() {
        data.save(&ctx).context("failed to save work units")?;
    }

    if json {
        print_json(&actions)?;
        return Ok(());
    }

    if actions.is_empty() {
        println!("Nothing to repair.");
        return Ok(());
    }
    for action in &actions {
        match action {
            RepairAction::Reindexed { id, from, to } => match from {
                Some(from) => println!("reindexed {id}: {from} -> {to}"),
                None => println!("indexed {id} under {to}"),
            },
            RepairAction::MirrorAdded { id, kind, target } => {
                println!("added mirror edge {id} {kind} {target}")
            }
            RepairAction::DanglingDropped { id, kind, target } => {
                println!("dropped dangling edge {id} {kind} {target}")
            }
        }
    }
    println!("{} repair action(s)", actions.len());
    Ok(())
}
