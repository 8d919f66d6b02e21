use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::io;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"^@[a-z0-9][a-z0-9\-]*$").unwrap())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Feature file stems currently using this tag. Removal is refused
    /// while this is non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub used_by: Vec<String>,
}

/// Registry of Gherkin tags usable in feature files. Unknown fields are
/// rejected at load, and [`TagsData::save`] re-validates before writing so
/// a bad mutation never reaches disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagsData {
    #[serde(default)]
    pub tags: BTreeMap<String, Tag>,
}

impl TagsData {
    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let path = ctx.tags_path();
        if !path.exists() {
            return Err(FspecError::NotInitialized);
        }
        io::read_json(&path)
    }

    /// Validate, then write. A validation failure surfaces before any byte
    /// is written, leaving the previous file content intact.
    pub fn save(&self, ctx: &ProjectContext) -> Result<()> {
        self.validate()?;
        io::write_json(&ctx.tags_path(), self)
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.tags.keys() {
            if !tag_re().is_match(name) {
                return Err(FspecError::SchemaValidation {
                    file: "tags.json".to_string(),
                    reason: format!("invalid tag name '{name}'"),
                });
            }
        }
        Ok(())
    }

    pub fn register(&mut self, name: &str, category: Option<String>) -> Result<()> {
        if !tag_re().is_match(name) {
            return Err(FspecError::InvalidTagName(name.to_string()));
        }
        if self.tags.contains_key(name) {
            return Err(FspecError::TagExists(name.to_string()));
        }
        self.tags.insert(
            name.to_string(),
            Tag {
                category,
                description: None,
                created_at: Utc::now(),
                used_by: Vec::new(),
            },
        );
        Ok(())
    }

    /// Rebuild every tag's `usedBy` list from a scan of the feature files.
    /// `files` maps each feature file stem to the registry-style tags found
    /// in it; tags that are not registered are ignored. Returns true when
    /// any list changed.
    pub fn sync_usage(&mut self, files: &BTreeMap<String, Vec<String>>) -> bool {
        let mut changed = false;
        for (name, tag) in self.tags.iter_mut() {
            let used: Vec<String> = files
                .iter()
                .filter(|(_, tags)| tags.iter().any(|t| t == name))
                .map(|(stem, _)| stem.clone())
                .collect();
            if tag.used_by != used {
                tag.used_by = used;
                changed = true;
            }
        }
        changed
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let tag = self
            .tags
            .get(name)
            .ok_or_else(|| FspecError::TagNotFound(name.to_string()))?;
        if !tag.used_by.is_empty() {
            return Err(FspecError::SchemaValidation {
                file: "tags.json".to_string(),
                reason: format!(
                    "tag '{name}' is still used by: {}",
                    tag.used_by.join(", ")
                ),
            });
        }
        self.tags.remove(name);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validates_names() {
        let mut tags = TagsData::default();
        tags.register("@smoke", None).unwrap();
        for bad in ["smoke", "@", "@UPPER", "@has space"] {
            assert!(tags.register(bad, None).is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn remove_refuses_while_used() {
        let mut tags = TagsData::default();
        tags.register("@smoke", None).unwrap();
        tags.tags
            .get_mut("@smoke")
            .unwrap()
            .used_by
            .push("user-login".to_string());

        assert!(tags.remove("@smoke").is_err());
        tags.tags.get_mut("@smoke").unwrap().used_by.clear();
        tags.remove("@smoke").unwrap();
    }

    #[test]
    fn sync_usage_tracks_feature_files() {
        let mut tags = TagsData::default();
        tags.register("@smoke", None).unwrap();
        tags.register("@wip", None).unwrap();

        let mut files = BTreeMap::new();
        files.insert(
            "user-login".to_string(),
            vec!["@smoke".to_string(), "@unregistered".to_string()],
        );
        files.insert("password-reset".to_string(), vec!["@smoke".to_string()]);

        assert!(tags.sync_usage(&files));
        assert_eq!(
            tags.tags["@smoke"].used_by,
            vec!["password-reset".to_string(), "user-login".to_string()]
        );
        assert!(tags.tags["@wip"].used_by.is_empty());
        assert!(tags.remove("@smoke").is_err());

        // Re-sync with no scanned usage after the files stop tagging it
        files.clear();
        assert!(tags.sync_usage(&files));
        tags.remove("@smoke").unwrap();

        // A no-op sync reports no change
        assert!(!tags.sync_usage(&files));
    }

    #[test]
    fn save_rejects_invalid_registry() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());

        let mut tags = TagsData::default();
        tags.register("@smoke", None).unwrap();
        tags.save(&ctx).unwrap();

        // Corrupt the in-memory registry; save must refuse and leave the
        // file untouched
        let valid = std::fs::read_to_string(ctx.tags_path()).unwrap();
        let tag = tags.tags.remove("@smoke").unwrap();
        tags.tags.insert("NOT-A-TAG".to_string(), tag);
        assert!(matches!(
            tags.save(&ctx),
            Err(FspecError::SchemaValidation { .. })
        ));
        assert_eq!(std::fs::read_to_string(ctx.tags_path()).unwrap(), valid);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        std::fs::create_dir_all(ctx.spec_dir()).unwrap();
        std::fs::write(ctx.tags_path(), r#"{"tags":{},"bogus":true}"#).unwrap();
        assert!(TagsData::load(&ctx).is_err());
    }
}
