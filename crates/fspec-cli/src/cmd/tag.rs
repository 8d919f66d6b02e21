use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fspec_core::tags::TagsData;
use fspec_core::ProjectContext;
use std::path::Path;

#[derive(Subcommand)]
pub enum TagSubcommand {
    /// Register a tag (@kebab-case)
    Register {
        name: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// List registered tags
    List,
    /// Remove a tag (fails while feature files still use it)
    Remove { name: String },
}

pub fn run(root: &Path, subcmd: TagSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TagSubcommand::Register { name, category } => register(root, &name, category, json),
        TagSubcommand::List => list(root, json),
        TagSubcommand::Remove { name } => remove(root, &name, json),
    }
}

fn register(root: &Path, name: &str, category: Option<String>, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut tags = TagsData::load(&ctx)?;
    tags.register(name, category)?;
    tags.save(&ctx).context("failed to save tags")?;

    if json {
        print_json(&serde_json::json!({ "name": name }))?;
    } else {
        println!("Registered tag {name}");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let tags = TagsData::load(&ctx)?;

    if json {
        print_json(&tags)?;
        return Ok(());
    }

    if tags.tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = tags
        .tags
        .iter()
        .map(|(name, tag)| {
            vec![
                name.clone(),
                tag.category.clone().unwrap_or_default(),
                tag.used_by.len().to_string(),
            ]
        })
        .collect();
    print_table(&["TAG", "CATEGORY", "USED BY"], rows);
    Ok(())
}

fn remove(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut tags = TagsData::load(&ctx)?;
    tags.remove(name)?;
    tags.save(&ctx).context("failed to save tags")?;

    if json {
        print_json(&serde_json::json!({ "name": name, "removed": true }))?;
    } else {
        println!("Removed tag {name}");
    }
    Ok(())
}
