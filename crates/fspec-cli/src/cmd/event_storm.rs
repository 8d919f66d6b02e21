use crate::output::{print_json, print_table};
use clap::Subcommand;
use fspec_core::collection;
use fspec_core::event_storm::{EventStorm, EventStormItem, EventStormItemKind};
use fspec_core::types::EventStormLevel;
use fspec_core::FspecError;
use std::path::Path;
use std::str::FromStr;

#[derive(Subcommand)]
pub enum EventStormSubcommand {
    /// Add an item to a work unit's event storm board
    Add {
        id: String,
        /// event, command, policy, hotspot, aggregate, bounded_context, external_system
        kind: String,
        text: String,
        /// Actor issuing a command (ignored for other kinds)
        #[arg(long)]
        actor: Option<String>,
    },
    /// Soft-delete an event storm item
    Remove { id: String, item_id: u32 },
    /// Restore a soft-deleted event storm item
    Restore { id: String, item_id: u32 },
    /// List event storm items
    List { id: String },
    /// Set the board's granularity level
    SetLevel {
        id: String,
        /// big_picture, process_modeling, or software_design
        level: String,
    },
    /// Permanently drop deleted items and renumber (irreversible)
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

pub fn run(root: &Path, subcmd: EventStormSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        EventStormSubcommand::Add {
            id,
            kind,
            text,
            actor,
        } => add(root, &id, &kind, text, actor, json),
        EventStormSubcommand::Remove { id, item_id } => remove(root, &id, item_id, json),
        EventStormSubcommand::Restore { id, item_id } => restore(root, &id, item_id, json),
        EventStormSubcommand::List { id } => list(root, &id, json),
        EventStormSubcommand::SetLevel { id, level } => set_level(root, &id, &level, json),
        EventStormSubcommand::Compact { id, force } => compact(root, &id, force, json),
    }
}

/// A board is created lazily at the big-picture level on first add.
fn storm_mut(unit: &mut fspec_core::workunit::WorkUnit) -> &mut EventStorm {
    unit.event_storm
        .get_or_insert_with(|| EventStorm::new(EventStormLevel::BigPicture))
}

fn storm_ref(unit: &fspec_core::workunit::WorkUnit) -> anyhow::Result<&EventStorm> {
    unit.event_storm
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("{} has no event storm board", unit.id))
}

fn add(
    root: &Path,
    unit_id: &str,
    kind: &str,
    text: String,
    actor: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let kind = EventStormItemKind::from_str(kind)?;
    let item_id = super::mutate_unit(root, unit_id, |unit| {
        let storm = storm_mut(unit);
        let id = storm.add(kind, text);
        if let Some(EventStormItem::Command {
            actor: slot, ..
        }) = collection::find_mut(&mut storm.items, id)
        {
            *slot = actor;
        }
        unit.touch();
        Ok(id)
    })?;

    if json {
        print_json(&serde_json::json!({ "id": unit_id, "itemId": item_id, "kind": kind.as_str() }))?;
    } else {
        println!("Added {kind} item {item_id} to {unit_id}");
    }
    Ok(())
}

fn remove(root: &Path, unit_id: &str, item_id: u32, json: bool) -> anyhow::Result<()> {
    let change = super::mutate_unit(root, unit_id, |unit| {
        let storm = unit
            .event_storm
            .as_mut()
            .ok_or(FspecError::ItemNotFound {
                collection: "eventStorm",
                id: item_id,
            })?;
        let change = collection::soft_delete(&mut storm.items, item_id, "eventStorm")?;
        unit.touch();
        Ok(change)
    })?;

    if json {
        print_json(&serde_json::json!({
            "id": unit_id,
            "itemId": item_id,
            "changed": change == collection::ItemChange::Changed,
        }))?;
    } else {
        println!("Removed event storm item {item_id} from {unit_id}");
    }
    Ok(())
}

fn restore(root: &Path, unit_id: &str, item_id: u32, json: bool) -> anyhow::Result<()> {
    let change = super::mutate_unit(root, unit_id, |unit| {
        let storm = unit
            .event_storm
            .as_mut()
            .ok_or(FspecError::ItemNotFound {
                collection: "eventStorm",
                id: item_id,
            })?;
        let change = collection::restore(&mut storm.items, item_id, "eventStorm")?;
        unit.touch();
        Ok(change)
    })?;

    if json {
        print_json(&serde_json::json!({
            "id": unit_id,
            "itemId": item_id,
            "changed": change == collection::ItemChange::Changed,
        }))?;
    } else {
        println!("Restored event storm item {item_id} on {unit_id}");
    }
    Ok(())
}

fn list(root: &Path, unit_id: &str, json: bool) -> anyhow::Result<()> {
    super::read_unit(root, unit_id, |unit| {
        let storm = storm_ref(unit)?;
        if json {
            print_json(storm)?;
            return Ok(());
        }

        println!("Level: {}", storm.level);
        if storm.items.is_empty() {
            println!("No items.");
            return Ok(());
        }
        let rows: Vec<Vec<String>> = storm
            .items
            .iter()
            .map(|item| {
                let common = item.common();
                vec![
                    common.id.to_string(),
                    item.kind().to_string(),
                    common.text.clone(),
                    if common.deleted { "deleted" } else { "" }.to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "KIND", "TEXT", ""], rows);
        Ok(())
    })
}

fn set_level(root: &Path, unit_id: &str, level: &str, json: bool) -> anyhow::Result<()> {
    let level = EventStormLevel::from_str(level)?;
    super::mutate_unit(root, unit_id, |unit| {
        storm_mut(unit).level = level;
        unit.touch();
        Ok(())
    })?;

    if json {
        print_json(&serde_json::json!({ "id": unit_id, "level": level.as_str() }))?;
    } else {
        println!("{unit_id} event storm level set to {level}");
    }
    Ok(())
}

fn compact(root: &Path, unit_id: &str, force: bool, json: bool) -> anyhow::Result<()> {
    let dropped = super::mutate_unit(root, unit_id, |unit| {
        unit.ensure_compactable(force)?;
        let storm = match unit.event_storm.as_mut() {
            Some(storm) => storm,
            None => return Ok(0),
        };
        let dropped = collection::compact(&mut storm.items, &mut storm.next_item_id);
        unit.touch();
        Ok(dropped)
    })?;

    if json {
        print_json(&serde_json::json!({ "id": unit_id, "dropped": dropped }))?;
    } else {
        println!("Compacted event storm on {unit_id}: dropped {dropped} deleted item(s)");
    }
    Ok(())
}
