use crate::output::{print_json, print_table};
use clap::Subcommand;
use fspec_core::collection::{
    self, ArchitectureNote, Assumption, Example, ItemChange, Question, Rule, SoftDeletable,
};
use fspec_core::workunit::{WorkUnit, WorkUnitsData};
use fspec_core::{io, FspecError, ProjectContext};
use std::path::Path;

// One command group per example-mapping collection. The groups share the
// soft-delete/restore/compact mechanics through the generic helpers below;
// only `add` and the list columns are collection-specific.

#[derive(Subcommand)]
pub enum RuleSubcommand {
    /// Add a business rule to a work unit
    Add { id: String, text: String },
    /// Soft-delete a rule by stable ID
    Remove { id: String, rule_id: u32 },
    /// Restore a soft-deleted rule
    Restore { id: String, rule_id: u32 },
    /// List rules (including soft-deleted)
    List { id: String },
    /// Permanently drop deleted rules and renumber (irreversible)
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ExampleSubcommand {
    /// Add an example, optionally attached to a rule
    Add {
        id: String,
        text: String,
        #[arg(long)]
        rule: Option<u32>,
    },
    Remove { id: String, example_id: u32 },
    Restore { id: String, example_id: u32 },
    List { id: String },
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum QuestionSubcommand {
    /// Add an open question
    Add { id: String, text: String },
    /// Answer a question (advisory-locked read-modify-write)
    Answer {
        id: String,
        question_id: u32,
        answer: String,
    },
    Remove { id: String, question_id: u32 },
    Restore { id: String, question_id: u32 },
    List { id: String },
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum AssumptionSubcommand {
    Add { id: String, text: String },
    Remove { id: String, assumption_id: u32 },
    Restore { id: String, assumption_id: u32 },
    List { id: String },
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// Add an architecture note
    Add { id: String, text: String },
    Remove { id: String, note_id: u32 },
    Restore { id: String, note_id: u32 },
    List { id: String },
    Compact {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Generic helpers
// ---------------------------------------------------------------------------

fn report_change(
    collection: &'static str,
    item_id: u32,
    verb: &str,
    change: ItemChange,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({
            "collection": collection,
            "itemId": item_id,
            "changed": change == ItemChange::Changed,
        }))?;
    } else if change == ItemChange::Changed {
        println!("{verb} {collection} item {item_id}");
    } else {
        println!("{collection} item {item_id} already {verb}, nothing to do");
    }
    Ok(())
}

fn add_cmd<T: SoftDeletable>(
    root: &Path,
    unit_id: &str,
    item: T,
    collection: &'static str,
    sel: impl FnOnce(&mut WorkUnit) -> (&mut Vec<T>, &mut u32),
    json: bool,
) -> anyhow::Result<()> {
    let id = super::mutate_unit(root, unit_id, |unit| {
        let (items, next_id) = sel(unit);
        let id = collection::append(items, item, next_id);
        unit.touch();
        Ok(id)
    })?;

    if json {
        print_json(&serde_json::json!({ "collection": collection, "itemId": id }))?;
    } else {
        println!("Added {collection} item {id} to {unit_id}");
    }
    Ok(())
}

fn remove_cmd<T: SoftDeletable>(
    root: &Path,
    unit_id: &str,
    item_id: u32,
    collection: &'static str,
    sel: impl FnOnce(&mut WorkUnit) -> &mut Vec<T>,
    json: bool,
) -> anyhow::Result<()> {
    let change = super::mutate_unit(root, unit_id, |unit| {
        let change = collection::soft_delete(sel(unit), item_id, collection)?;
        unit.touch();
        Ok(change)
    })?;
    report_change(collection, item_id, "removed", change, json)
}

fn restore_cmd<T: SoftDeletable>(
    root: &Path,
    unit_id: &str,
    item_id: u32,
    collection: &'static str,
    sel: impl FnOnce(&mut WorkUnit) -> &mut Vec<T>,
    json: bool,
) -> anyhow::Result<()> {
    let change = super::mutate_unit(root, unit_id, |unit| {
        let change = collection::restore(sel(unit), item_id, collection)?;
        unit.touch();
        Ok(change)
    })?;
    report_change(collection, item_id, "restored", change, json)
}

fn compact_cmd<T: SoftDeletable>(
    root: &Path,
    unit_id: &str,
    collection: &'static str,
    force: bool,
    sel: impl FnOnce(&mut WorkUnit) -> (&mut Vec<T>, &mut u32),
    json: bool,
) -> anyhow::Result<()> {
    let dropped = super::mutate_unit(root, unit_id, |unit| {
        unit.ensure_compactable(force)?;
        if force && unit.status != fspec_core::types::WorkUnitStatus::Done {
            eprintln!(
                "warning: compacting {collection} on {unit_id} during active development drops soft-deleted history"
            );
        }
        let (items, next_id) = sel(unit);
        let dropped = collection::compact(items, next_id);
        unit.touch();
        Ok(dropped)
    })?;

    if json {
        print_json(&serde_json::json!({ "collection": collection, "dropped": dropped }))?;
    } else {
        println!("Compacted {collection} on {unit_id}: dropped {dropped} deleted item(s)");
    }
    Ok(())
}

fn list_cmd<T: SoftDeletable + serde::Serialize>(
    root: &Path,
    unit_id: &str,
    headers: &[&str],
    sel: impl FnOnce(&WorkUnit) -> &Vec<T>,
    row: impl Fn(&T) -> Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    super::read_unit(root, unit_id, |unit| {
        let items = sel(unit);
        if json {
            print_json(items)?;
            return Ok(());
        }
        if items.is_empty() {
            println!("No items.");
            return Ok(());
        }
        print_table(headers, items.iter().map(&row).collect());
        Ok(())
    })
}

fn flag(deleted: bool) -> String {
    if deleted { "deleted" } else { "" }.to_string()
}

// ---------------------------------------------------------------------------
// Dispatchers
// ---------------------------------------------------------------------------

pub fn run_rule(root: &Path, subcmd: RuleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        RuleSubcommand::Add { id, text } => add_cmd(
            root,
            &id,
            Rule::new(text),
            "rules",
            |u| (&mut u.rules, &mut u.next_rule_id),
            json,
        ),
        RuleSubcommand::Remove { id, rule_id } => {
            remove_cmd(root, &id, rule_id, "rules", |u| &mut u.rules, json)
        }
        RuleSubcommand::Restore { id, rule_id } => {
            restore_cmd(root, &id, rule_id, "rules", |u| &mut u.rules, json)
        }
        RuleSubcommand::List { id } => list_cmd(
            root,
            &id,
            &["ID", "TEXT", ""],
            |u| &u.rules,
            |r| vec![r.id.to_string(), r.text.clone(), flag(r.deleted)],
            json,
        ),
        RuleSubcommand::Compact { id, force } => compact_cmd(
            root,
            &id,
            "rules",
            force,
            |u| (&mut u.rules, &mut u.next_rule_id),
            json,
        ),
    }
}

pub fn run_example(root: &Path, subcmd: ExampleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ExampleSubcommand::Add { id, text, rule } => add_cmd(
            root,
            &id,
            Example::new(text, rule),
            "examples",
            |u| (&mut u.examples, &mut u.next_example_id),
            json,
        ),
        ExampleSubcommand::Remove { id, example_id } => {
            remove_cmd(root, &id, example_id, "examples", |u| &mut u.examples, json)
        }
        ExampleSubcommand::Restore { id, example_id } => restore_cmd(
            root,
            &id,
            example_id,
            "examples",
            |u| &mut u.examples,
            json,
        ),
        ExampleSubcommand::List { id } => list_cmd(
            root,
            &id,
            &["ID", "RULE", "TEXT", ""],
            |u| &u.examples,
            |e| {
                vec![
                    e.id.to_string(),
                    e.rule_id.map(|r| r.to_string()).unwrap_or_default(),
                    e.text.clone(),
                    flag(e.deleted),
                ]
            },
            json,
        ),
        ExampleSubcommand::Compact { id, force } => compact_cmd(
            root,
            &id,
            "examples",
            force,
            |u| (&mut u.examples, &mut u.next_example_id),
            json,
        ),
    }
}

pub fn run_question(root: &Path, subcmd: QuestionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        QuestionSubcommand::Add { id, text } => add_cmd(
            root,
            &id,
            Question::new(text),
            "questions",
            |u| (&mut u.questions, &mut u.next_question_id),
            json,
        ),
        QuestionSubcommand::Answer {
            id,
            question_id,
            answer,
        } => answer_question(root, &id, question_id, answer, json),
        QuestionSubcommand::Remove { id, question_id } => remove_cmd(
            root,
            &id,
            question_id,
            "questions",
            |u| &mut u.questions,
            json,
        ),
        QuestionSubcommand::Restore { id, question_id } => restore_cmd(
            root,
            &id,
            question_id,
            "questions",
            |u| &mut u.questions,
            json,
        ),
        QuestionSubcommand::List { id } => list_cmd(
            root,
            &id,
            &["ID", "QUESTION", "ANSWER", ""],
            |u| &u.questions,
            |q| {
                vec![
                    q.id.to_string(),
                    q.text.clone(),
                    q.answer.clone().unwrap_or_default(),
                    flag(q.deleted),
                ]
            },
            json,
        ),
        QuestionSubcommand::Compact { id, force } => compact_cmd(
            root,
            &id,
            "questions",
            force,
            |u| (&mut u.questions, &mut u.next_question_id),
            json,
        ),
    }
}

/// Answering is the one write path that holds an advisory file lock around
/// its read-modify-write, since agents routinely answer questions in
/// parallel with other commands.
fn answer_question(
    root: &Path,
    unit_id: &str,
    question_id: u32,
    answer: String,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    io::with_file_lock(&ctx.work_units_path(), || {
        let mut data = WorkUnitsData::load(&ctx)?;
        let unit = data.get_mut(unit_id)?;
        let question = collection::find_mut(&mut unit.questions, question_id).ok_or(
            FspecError::ItemNotFound {
                collection: "questions",
                id: question_id,
            },
        )?;
        question.answer = Some(answer.clone());
        unit.touch();
        data.save(&ctx)
    })?;

    if json {
        print_json(&serde_json::json!({ "id": unit_id, "questionId": question_id }))?;
    } else {
        println!("Answered question {question_id} on {unit_id}");
    }
    Ok(())
}

pub fn run_assumption(root: &Path, subcmd: AssumptionSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AssumptionSubcommand::Add { id, text } => add_cmd(
            root,
            &id,
            Assumption::new(text),
            "assumptions",
            |u| (&mut u.assumptions, &mut u.next_assumption_id),
            json,
        ),
        AssumptionSubcommand::Remove { id, assumption_id } => remove_cmd(
            root,
            &id,
            assumption_id,
            "assumptions",
            |u| &mut u.assumptions,
            json,
        ),
        AssumptionSubcommand::Restore { id, assumption_id } => restore_cmd(
            root,
            &id,
            assumption_id,
            "assumptions",
            |u| &mut u.assumptions,
            json,
        ),
        AssumptionSubcommand::List { id } => list_cmd(
            root,
            &id,
            &["ID", "TEXT", ""],
            |u| &u.assumptions,
            |a| vec![a.id.to_string(), a.text.clone(), flag(a.deleted)],
            json,
        ),
        AssumptionSubcommand::Compact { id, force } => compact_cmd(
            root,
            &id,
            "assumptions",
            force,
            |u| (&mut u.assumptions, &mut u.next_assumption_id),
            json,
        ),
    }
}

pub fn run_note(root: &Path, subcmd: NoteSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NoteSubcommand::Add { id, text } => add_cmd(
            root,
            &id,
            ArchitectureNote::new(text),
            "architectureNotes",
            |u| (&mut u.architecture_notes, &mut u.next_note_id),
            json,
        ),
        NoteSubcommand::Remove { id, note_id } => remove_cmd(
            root,
            &id,
            note_id,
            "architectureNotes",
            |u| &mut u.architecture_notes,
            json,
        ),
        NoteSubcommand::Restore { id, note_id } => restore_cmd(
            root,
            &id,
            note_id,
            "architectureNotes",
            |u| &mut u.architecture_notes,
            json,
        ),
        NoteSubcommand::List { id } => list_cmd(
            root,
            &id,
            &["ID", "TEXT", ""],
            |u| &u.architecture_notes,
            |n| vec![n.id.to_string(), n.text.clone(), flag(n.deleted)],
            json,
        ),
        NoteSubcommand::Compact { id, force } => compact_cmd(
            root,
            &id,
            "architectureNotes",
            force,
            |u| (&mut u.architecture_notes, &mut u.next_note_id),
            json,
        ),
    }
}
