use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fspec_core::epic::EpicsData;
use fspec_core::prefix::PrefixesData;
use fspec_core::status::{self, TransitionOptions};
use fspec_core::types::{WorkUnitStatus, WorkUnitType};
use fspec_core::workunit::{WorkUnit, WorkUnitsData};
use fspec_core::{graph, ProjectContext};
use std::path::Path;
use std::str::FromStr;

#[derive(Subcommand)]
pub enum WorkUnitSubcommand {
    /// Create a work unit under a registered prefix
    Create {
        /// Registered ID prefix (e.g. AUTH)
        prefix: String,
        #[arg(long)]
        title: String,
        /// story, bug, or task
        #[arg(long = "type", default_value = "story")]
        unit_type: String,
        #[arg(long)]
        epic: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show full details for a work unit
    Show { id: String },
    /// List work units, optionally filtered
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        epic: Option<String>,
    },
    /// Transition a work unit to a new status
    SetStatus {
        id: String,
        status: String,
        /// Required when the target status is blocked
        #[arg(long)]
        reason: Option<String>,
        /// Skip feature/test artifact temporal checks (reverse-ACDD import)
        #[arg(long)]
        skip_artifact_check: bool,
    },
    /// Set a work unit's parent (cycle-checked)
    SetParent { id: String, parent: String },
    /// Detach a work unit from its parent
    ClearParent { id: String },
    /// Assign a work unit to an epic
    SetEpic { id: String, epic: String },
    /// Change the work unit type (fails: type is immutable once set)
    SetType { id: String, unit_type: String },
    /// Edit title or description
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Record the test artifact path checked before implementing
    SetTestArtifact { id: String, path: String },
}

pub fn run(root: &Path, subcmd: WorkUnitSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkUnitSubcommand::Create {
            prefix,
            title,
            unit_type,
            epic,
            description,
        } => create(
            root,
            &prefix,
            &title,
            &unit_type,
            epic.as_deref(),
            description,
            json,
        ),
        WorkUnitSubcommand::Show { id } => show(root, &id, json),
        WorkUnitSubcommand::List { status, epic } => {
            list(root, status.as_deref(), epic.as_deref(), json)
        }
        WorkUnitSubcommand::SetStatus {
            id,
            status,
            reason,
            skip_artifact_check,
        } => set_status(root, &id, &status, reason, skip_artifact_check, json),
        WorkUnitSubcommand::SetParent { id, parent } => set_parent(root, &id, &parent, json),
        WorkUnitSubcommand::ClearParent { id } => clear_parent(root, &id, json),
        WorkUnitSubcommand::SetEpic { id, epic } => set_epic(root, &id, &epic, json),
        WorkUnitSubcommand::SetType { id, unit_type } => set_type(root, &id, &unit_type, json),
        WorkUnitSubcommand::Edit {
            id,
            title,
            description,
        } => edit(root, &id, title, description, json),
        WorkUnitSubcommand::SetTestArtifact { id, path } => {
            set_test_artifact(root, &id, &path, json)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn create(
    root: &Path,
    prefix: &str,
    title: &str,
    unit_type: &str,
    epic: Option<&str>,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let unit_type = WorkUnitType::from_str(unit_type)?;

    if let Some(epic) = epic {
        let epics = EpicsData::load(&ctx)?;
        epics.ensure_exists(epic)?;
    }

    let mut prefixes = PrefixesData::load(&ctx)?;
    let id = prefixes.allocate_id(prefix)?;

    let mut data = WorkUnitsData::load(&ctx)?;
    let mut unit = WorkUnit::new(&id, title, unit_type);
    unit.epic = epic.map(String::from);
    unit.description = description;
    data.insert(unit)?;

    // Burn the sequence number first: if the second write fails, a skipped
    // ID is harmless, while the reverse order could re-allocate an ID and
    // collide with the already-persisted unit.
    prefixes.save(&ctx).context("failed to save prefixes")?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "title": title, "status": "backlog" }))?;
    } else {
        println!("Created {id}: {title}");
    }
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    super::read_unit(root, id, |unit| {
        if json {
            print_json(unit)?;
            return Ok(());
        }

        println!("{}: {}", unit.id, unit.title);
        println!("Status:  {}", unit.status);
        println!("Type:    {}", unit.unit_type);
        if let Some(desc) = &unit.description {
            println!("Description: {desc}");
        }
        if let Some(epic) = &unit.epic {
            println!("Epic:    {epic}");
        }
        if let Some(parent) = &unit.parent {
            println!("Parent:  {parent}");
        }
        if let Some(reason) = &unit.blocked_reason {
            println!("Blocked: {reason}");
        }
        for kind in fspec_core::types::RelationKind::all() {
            if let Some(edges) = unit.edges(*kind).as_ref() {
                println!("{}: {}", kind, edges.join(", "));
            }
        }
        let open_questions = unit
            .questions
            .iter()
            .filter(|q| !q.deleted && !q.is_answered())
            .count();
        if open_questions > 0 {
            println!("Open questions: {open_questions}");
        }
        Ok(())
    })
}

fn list(
    root: &Path,
    status: Option<&str>,
    epic: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let data = WorkUnitsData::load(&ctx)?;
    let status = status.map(WorkUnitStatus::from_str).transpose()?;

    let units: Vec<&WorkUnit> = data
        .work_units
        .values()
        .filter(|u| status.is_none_or(|s| u.status == s))
        .filter(|u| epic.is_none_or(|e| u.epic.as_deref() == Some(e)))
        .collect();

    if json {
        print_json(&units)?;
        return Ok(());
    }

    if units.is_empty() {
        println!("No work units.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = units
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.status.to_string(),
                u.unit_type.to_string(),
                u.epic.clone().unwrap_or_default(),
                u.title.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "TYPE", "EPIC", "TITLE"], rows);
    Ok(())
}

fn set_status(
    root: &Path,
    id: &str,
    status: &str,
    reason: Option<String>,
    skip_artifact_check: bool,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let target = WorkUnitStatus::from_str(status)?;
    let mut data = WorkUnitsData::load(&ctx)?;

    let opts = TransitionOptions {
        reason,
        skip_artifact_check,
    };
    status::transition(&ctx, &mut data, id, target, &opts)
        .with_context(|| format!("cannot transition {id} to {target}"))?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "status": target.as_str() }))?;
    } else {
        println!("{id} -> {target}");
    }
    Ok(())
}

fn set_parent(root: &Path, id: &str, parent: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut data = WorkUnitsData::load(&ctx)?;
    graph::set_parent(&mut data, id, parent)?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "parent": parent }))?;
    } else {
        println!("{id} parent set to {parent}");
    }
    Ok(())
}

fn clear_parent(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut data = WorkUnitsData::load(&ctx)?;
    let changed = graph::clear_parent(&mut data, id)?;
    data.save(&ctx).context("failed to save work units")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "changed": changed }))?;
    } else if changed {
        println!("{id} detached from parent");
    } else {
        println!("{id} has no parent");
    }
    Ok(())
}

fn set_epic(root: &Path, id: &str, epic: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let epics = EpicsData::load(&ctx)?;
    epics.ensure_exists(epic)?;

    super::mutate_unit(root, id, |unit| {
        unit.epic = Some(epic.to_string());
        unit.touch();
        Ok(())
    })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "epic": epic }))?;
    } else {
        println!("{id} assigned to epic {epic}");
    }
    Ok(())
}

fn set_type(root: &Path, id: &str, unit_type: &str, json: bool) -> anyhow::Result<()> {
    let unit_type = WorkUnitType::from_str(unit_type)?;
    let changed = super::mutate_unit(root, id, |unit| Ok(unit.set_type(unit_type)?))?;

    if json {
        print_json(&serde_json::json!({ "id": id, "type": unit_type.as_str(), "changed": changed }))?;
    } else {
        println!("{id} is already a {unit_type}");
    }
    Ok(())
}

fn edit(
    root: &Path,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    super::mutate_unit(root, id, |unit| {
        if let Some(title) = title {
            unit.title = title;
        }
        if let Some(description) = description {
            unit.description = Some(description);
        }
        unit.touch();
        Ok(())
    })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "updated": true }))?;
    } else {
        println!("Updated {id}");
    }
    Ok(())
}

fn set_test_artifact(root: &Path, id: &str, path: &str, json: bool) -> anyhow::Result<()> {
    super::mutate_unit(root, id, |unit| {
        unit.test_artifact = Some(path.to_string());
        unit.touch();
        Ok(())
    })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "testArtifact": path }))?;
    } else {
        println!("{id} test artifact set to {path}");
    }
    Ok(())
}
