use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fspec_core::prefix::PrefixesData;
use fspec_core::ProjectContext;
use std::path::Path;

#[derive(Subcommand)]
pub enum PrefixSubcommand {
    /// Register an ID prefix (2-10 chars, uppercase alphanumeric)
    Register {
        prefix: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List registered prefixes
    List,
}

pub fn run(root: &Path, subcmd: PrefixSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        PrefixSubcommand::Register {
            prefix,
            description,
        } => register(root, &prefix, description, json),
        PrefixSubcommand::List => list(root, json),
    }
}

fn register(
    root: &Path,
    prefix: &str,
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut prefixes = PrefixesData::load(&ctx)?;
    prefixes.register(prefix, description)?;
    prefixes.save(&ctx).context("failed to save prefixes")?;

    if json {
        print_json(&serde_json::json!({ "prefix": prefix }))?;
    } else {
        println!("Registered prefix {prefix}");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let prefixes = PrefixesData::load(&ctx)?;

    if json {
        print_json(&prefixes)?;
        return Ok(());
    }

    if prefixes.prefixes.is_empty() {
        println!("No prefixes.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = prefixes
        .prefixes
        .iter()
        .map(|(prefix, entry)| {
            vec![
                prefix.clone(),
                entry.next_sequence.to_string(),
                entry.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["PREFIX", "NEXT", "DESCRIPTION"], rows);
    Ok(())
}
