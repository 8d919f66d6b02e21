use crate::context::ProjectContext;
use crate::error::Result;
use crate::io;
use crate::paths;
use crate::workunit::WorkUnit;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

// Gherkin parsing is out of scope; the state machine only needs feature
// file existence, mtime, and the @PREFIX-n tag strings.

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static REGISTRY_TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"@([A-Z][A-Z0-9]{1,9}-\d+)").unwrap())
}

fn registry_tag_re() -> &'static Regex {
    REGISTRY_TAG_RE.get_or_init(|| Regex::new(r"@[a-z0-9][a-z0-9\-]*").unwrap())
}

/// Work unit IDs tagged in a feature file's text.
pub fn extract_work_unit_tags(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in tag_re().captures_iter(content) {
        let id = caps[1].to_string();
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Lowercase `@tag` tokens in a feature file's text, `@` included, deduped
/// in order of first appearance. These are candidate registry tags; whether
/// a token is actually registered is the registry's concern.
pub fn extract_registry_tags(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in registry_tag_re().find_iter(content) {
        let tag = m.as_str().to_string();
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Modification time of `path`, or None if the file does not exist.
pub fn modified_at(path: &Path) -> Result<Option<DateTime<Utc>>> {
    if !path.exists() {
        return Ok(None);
    }
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(Some(modified.into()))
}

/// Scaffold `spec/features/<kebab-title>.feature` for a work unit, seeding
/// scenarios from its non-deleted rules and examples. Returns the stem; an
/// existing file is left untouched.
pub fn scaffold(ctx: &ProjectContext, unit: &WorkUnit) -> Result<String> {
    let stem = paths::kebab_case(&unit.title);
    let path = ctx.feature_file_path(&stem);

    let mut content = format!("@{}\nFeature: {}\n", unit.id, unit.title);
    if let Some(desc) = &unit.description {
        for line in desc.lines() {
            content.push_str("  ");
            content.push_str(line);
            content.push('\n');
        }
    }
    for rule in unit.rules.iter().filter(|r| !r.deleted) {
        content.push_str(&format!("\n  Rule: {}\n", rule.text));
        for example in unit
            .examples
            .iter()
            .filter(|e| !e.deleted && e.rule_id == Some(rule.id))
        {
            content.push_str(&format!("\n    Example: {}\n", example.text));
        }
    }
    for example in unit
        .examples
        .iter()
        .filter(|e| !e.deleted && e.rule_id.is_none())
    {
        content.push_str(&format!("\n  Example: {}\n", example.text));
    }

    io::write_if_missing(&path, content.as_bytes())?;
    Ok(stem)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{self, Example, Rule};
    use crate::types::WorkUnitType;
    use tempfile::TempDir;

    #[test]
    fn extracts_tags_once_each() {
        let content = "@AUTH-001 @smoke\nFeature: Login\n  @AUTH-001 @UI-042\n  Scenario: ok\n";
        assert_eq!(
            extract_work_unit_tags(content),
            vec!["AUTH-001".to_string(), "UI-042".to_string()]
        );
    }

    #[test]
    fn lowercase_tags_are_not_work_unit_ids() {
        assert!(extract_work_unit_tags("@smoke @wip\nFeature: x\n").is_empty());
    }

    #[test]
    fn modified_at_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(modified_at(&dir.path().join("nope.feature"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn scaffold_writes_rules_and_examples() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());

        let mut unit = WorkUnit::new("AUTH-001", "User Login", WorkUnitType::Story);
        let rule_id = collection::append(
            &mut unit.rules,
            Rule::new("Passwords must be verified"),
            &mut unit.next_rule_id,
        );
        collection::append(
            &mut unit.examples,
            Example::new("Valid password logs in", Some(rule_id)),
            &mut unit.next_example_id,
        );

        let stem = scaffold(&ctx, &unit).unwrap();
        assert_eq!(stem, "user-login");

        let content =
            std::fs::read_to_string(dir.path().join("spec/features/user-login.feature")).unwrap();
        assert!(content.starts_with("@AUTH-001\nFeature: User Login\n"));
        assert!(content.contains("Rule: Passwords must be verified"));
        assert!(content.contains("Example: Valid password logs in"));
    }

    #[test]
    fn scaffold_leaves_existing_file() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        std::fs::create_dir_all(dir.path().join("spec/features")).unwrap();
        std::fs::write(
            dir.path().join("spec/features/user-login.feature"),
            "hand-written",
        )
        .unwrap();

        let unit = WorkUnit::new("AUTH-001", "User Login", WorkUnitType::Story);
        scaffold(&ctx, &unit).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("spec/features/user-login.feature")).unwrap(),
            "hand-written"
        );
    }
}
