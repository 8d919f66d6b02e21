use crate::output::print_json;
use fspec_core::epic::EpicsData;
use fspec_core::foundation::Foundation;
use fspec_core::prefix::PrefixesData;
use fspec_core::tags::TagsData;
use fspec_core::workunit::WorkUnitsData;
use fspec_core::{io, ProjectContext};
use std::path::Path;

/// Scaffold the spec/ directory and the five JSON documents. Idempotent:
/// existing documents are never overwritten.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    io::ensure_dir(&ctx.features_dir())?;

    let mut created: Vec<&str> = Vec::new();

    if !ctx.work_units_path().exists() {
        WorkUnitsData::new().save(&ctx)?;
        created.push("spec/work-units.json");
    }
    if !ctx.epics_path().exists() {
        EpicsData::default().save(&ctx)?;
        created.push("spec/epics.json");
    }
    if !ctx.prefixes_path().exists() {
        PrefixesData::default().save(&ctx)?;
        created.push("spec/prefixes.json");
    }
    if !ctx.tags_path().exists() {
        TagsData::default().save(&ctx)?;
        created.push("spec/tags.json");
    }
    if !ctx.foundation_path().exists() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        Foundation::new(name).save(&ctx)?;
        created.push("spec/foundation.json");
    }

    if json {
        print_json(&serde_json::json!({ "root": root, "created": created }))?;
    } else if created.is_empty() {
        println!("Already initialized at {}", root.display());
    } else {
        println!("Initialized fspec project at {}", root.display());
        for file in created {
            println!("  created {file}");
        }
    }
    Ok(())
}
