use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Next sequence number to allocate for this prefix. Never reused.
    #[serde(default = "default_sequence")]
    pub next_sequence: u32,
}

fn default_sequence() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixesData {
    #[serde(default)]
    pub prefixes: BTreeMap<String, PrefixEntry>,
}

impl PrefixesData {
    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let path = ctx.prefixes_path();
        if !path.exists() {
            return Err(FspecError::NotInitialized);
        }
        io::read_json(&path)
    }

    pub fn save(&self, ctx: &ProjectContext) -> Result<()> {
        io::write_json(&ctx.prefixes_path(), self)
    }

    pub fn register(&mut self, prefix: &str, description: Option<String>) -> Result<()> {
        paths::validate_prefix(prefix)?;
        if self.prefixes.contains_key(prefix) {
            return Err(FspecError::PrefixExists(prefix.to_string()));
        }
        self.prefixes.insert(
            prefix.to_string(),
            PrefixEntry {
                description,
                next_sequence: 1,
            },
        );
        Ok(())
    }

    /// Allocate the next `<PREFIX>-<sequence>` ID, zero-padded to 3 digits.
    /// The prefix must be registered first.
    pub fn allocate_id(&mut self, prefix: &str) -> Result<String> {
        let entry = self
            .prefixes
            .get_mut(prefix)
            .ok_or_else(|| FspecError::PrefixNotRegistered(prefix.to_string()))?;
        let id = format!("{prefix}-{:03}", entry.next_sequence);
        entry.next_sequence += 1;
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_requires_registration() {
        let mut prefixes = PrefixesData::default();
        assert!(matches!(
            prefixes.allocate_id("AUTH"),
            Err(FspecError::PrefixNotRegistered(_))
        ));
    }

    #[test]
    fn allocate_sequences_and_pads() {
        let mut prefixes = PrefixesData::default();
        prefixes.register("AUTH", None).unwrap();
        assert_eq!(prefixes.allocate_id("AUTH").unwrap(), "AUTH-001");
        assert_eq!(prefixes.allocate_id("AUTH").unwrap(), "AUTH-002");

        // Sequences keep growing past the padding width
        prefixes.prefixes.get_mut("AUTH").unwrap().next_sequence = 1000;
        assert_eq!(prefixes.allocate_id("AUTH").unwrap(), "AUTH-1000");
    }

    #[test]
    fn register_validates_and_rejects_duplicates() {
        let mut prefixes = PrefixesData::default();
        assert!(matches!(
            prefixes.register("auth", None),
            Err(FspecError::InvalidPrefix(_))
        ));
        prefixes.register("AUTH", None).unwrap();
        assert!(matches!(
            prefixes.register("AUTH", None),
            Err(FspecError::PrefixExists(_))
        ));
    }
}
