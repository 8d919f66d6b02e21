use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fspec_core::epic::EpicsData;
use fspec_core::workunit::WorkUnitsData;
use fspec_core::ProjectContext;
use std::path::Path;

#[derive(Subcommand)]
pub enum EpicSubcommand {
    /// Register a new epic
    Create {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List epics with their work unit counts
    List,
    /// Delete an epic (fails while work units still reference it)
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: EpicSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        EpicSubcommand::Create {
            id,
            title,
            description,
        } => create(root, &id, &title, description, json),
        EpicSubcommand::List => list(root, json),
        EpicSubcommand::Delete { id } => delete(root, &id, json),
    }
}

fn create(
    root: &Path,
    id: &str,
    title: &str,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut epics = EpicsData::load(&ctx)?;
    epics.create(id, title, description)?;
    epics.save(&ctx).context("failed to save epics")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "title": title }))?;
    } else {
        println!("Created epic {id}: {title}");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let epics = EpicsData::load(&ctx)?;

    if json {
        print_json(&epics)?;
        return Ok(());
    }

    if epics.epics.is_empty() {
        println!("No epics.");
        return Ok(());
    }

    let units = WorkUnitsData::load(&ctx)?;
    let rows: Vec<Vec<String>> = epics
        .epics
        .iter()
        .map(|(id, epic)| {
            let count = units
                .work_units
                .values()
                .filter(|u| u.epic.as_deref() == Some(id.as_str()))
                .count();
            vec![id.clone(), epic.title.clone(), count.to_string()]
        })
        .collect();
    print_table(&["ID", "TITLE", "UNITS"], rows);
    Ok(())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let units = WorkUnitsData::load(&ctx)?;
    let mut epics = EpicsData::load(&ctx)?;
    epics.delete(id, &units)?;
    epics.save(&ctx).context("failed to save epics")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted epic {id}");
    }
    Ok(())
}
