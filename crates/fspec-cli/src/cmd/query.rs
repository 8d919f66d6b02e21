use crate::output::{print_json, print_table};
use clap::Subcommand;
use fspec_core::workunit::WorkUnitsData;
use fspec_core::{graph, ProjectContext};
use std::path::Path;

#[derive(Subcommand)]
pub enum QuerySubcommand {
    /// Rank work units by how many others they transitively block
    Bottlenecks,
    /// List work units with no epic and no relationships
    Orphans,
    /// List blocked work units with their reasons
    Blocked,
}

pub fn run(root: &Path, subcmd: QuerySubcommand, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let data = WorkUnitsData::load(&ctx)?;
    match subcmd {
        QuerySubcommand::Bottlenecks => bottlenecks(&data, json),
        QuerySubcommand::Orphans => orphans(&data, json),
        QuerySubcommand::Blocked => blocked(&data, json),
    }
}

fn bottlenecks(data: &WorkUnitsData, json: bool) -> anyhow::Result<()> {
    let found = graph::bottlenecks(data);

    if json {
        print_json(&found)?;
        return Ok(());
    }

    if found.is_empty() {
        println!("No bottlenecks.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = found
        .iter()
        .map(|b| {
            let title = data
                .work_units
                .get(&b.id)
                .map(|u| u.title.clone())
                .unwrap_or_default();
            vec![b.id.clone(), b.score.to_string(), title]
        })
        .collect();
    print_table(&["ID", "BLOCKS", "TITLE"], rows);
    Ok(())
}

fn orphans(data: &WorkUnitsData, json: bool) -> anyhow::Result<()> {
    let found = graph::orphans(data);

    if json {
        print_json(&found)?;
        return Ok(());
    }

    if found.is_empty() {
        println!("No orphans.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = found
        .iter()
        .map(|u| vec![u.id.clone(), u.status.to_string(), u.title.clone()])
        .collect();
    print_table(&["ID", "STATUS", "TITLE"], rows);
    Ok(())
}

fn blocked(data: &WorkUnitsData, json: bool) -> anyhow::Result<()> {
    let found: Vec<_> = data
        .work_units
        .values()
        .filter(|u| u.status == fspec_core::types::WorkUnitStatus::Blocked)
        .collect();

    if json {
        print_json(&found)?;
        return Ok(());
    }

    if found.is_empty() {
        println!("Nothing blocked.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = found
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.title.clone(),
                u.blocked_reason.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "REASON"], rows);
    Ok(())
}
