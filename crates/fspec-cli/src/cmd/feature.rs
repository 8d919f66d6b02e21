use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use fspec_core::tags::TagsData;
use fspec_core::workunit::WorkUnitsData;
use fspec_core::{feature_file, ProjectContext};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Subcommand)]
pub enum FeatureSubcommand {
    /// Scaffold a Gherkin feature file from a work unit's rules and examples
    Create { id: String },
    /// List feature files and the work units they tag
    List,
    /// Rescan feature files and update tag usage in the registry
    Sync,
}

pub fn run(root: &Path, subcmd: FeatureSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FeatureSubcommand::Create { id } => create(root, &id, json),
        FeatureSubcommand::List => list(root, json),
        FeatureSubcommand::Sync => sync(root, json),
    }
}

/// Sorted (stem, content) pairs for every `.feature` file in the project.
fn scan_features(ctx: &ProjectContext) -> anyhow::Result<Vec<(String, String)>> {
    let dir = ctx.features_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("feature") {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push((stem, content));
    }
    Ok(files)
}

/// Rebuild the tag registry's usage lists from the files on disk. Returns
/// true when the registry changed and was rewritten.
fn sync_tag_usage(ctx: &ProjectContext) -> anyhow::Result<bool> {
    let usage: BTreeMap<String, Vec<String>> = scan_features(ctx)?
        .into_iter()
        .map(|(stem, content)| (stem, feature_file::extract_registry_tags(&content)))
        .collect();

    let mut tags = TagsData::load(ctx)?;
    if !tags.sync_usage(&usage) {
        return Ok(false);
    }
    tags.save(ctx).context("failed to save tags")?;
    Ok(true)
}

fn create(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut data = WorkUnitsData::load(&ctx)?;

    let stem = feature_file::scaffold(&ctx, data.get(id)?)
        .with_context(|| format!("cannot scaffold feature file for {id}"))?;

    let unit = data.get_mut(id)?;
    unit.feature_file = Some(stem.clone());
    unit.touch();
    data.save(&ctx).context("failed to save work units")?;

    // The file may have pre-existed with hand-written tags
    sync_tag_usage(&ctx)?;

    if json {
        print_json(&serde_json::json!({ "id": id, "featureFile": stem }))?;
    } else {
        println!("{id} -> spec/features/{stem}.feature");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let rows: Vec<(String, Vec<String>)> = scan_features(&ctx)?
        .into_iter()
        .map(|(stem, content)| (stem, feature_file::extract_work_unit_tags(&content)))
        .collect();

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(name, tags)| serde_json::json!({ "file": name, "workUnits": tags }))
            .collect();
        print_json(&out)?;
        return Ok(());
    }

    if rows.is_empty() {
        println!("No feature files.");
        return Ok(());
    }
    print_table(
        &["FILE", "WORK UNITS"],
        rows.into_iter()
            .map(|(name, tags)| vec![name, tags.join(", ")])
            .collect(),
    );
    Ok(())
}

fn sync(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let changed = sync_tag_usage(&ctx)?;

    if json {
        print_json(&serde_json::json!({ "changed": changed }))?;
    } else if changed {
        println!("Tag usage updated.");
    } else {
        println!("Tag usage already up to date.");
    }
    Ok(())
}
