use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::io;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project-level foundation document: the stable context an agent reads
/// before touching any work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Foundation {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Foundation {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project_name: project_name.into(),
            vision: None,
            problem: None,
            users: None,
            architecture: None,
            last_updated: Utc::now(),
        }
    }

    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let path = ctx.foundation_path();
        if !path.exists() {
            return Err(FspecError::NotInitialized);
        }
        io::read_json(&path)
    }

    /// Validate, then write. A validation failure leaves the previous file
    /// content intact.
    pub fn save(&mut self, ctx: &ProjectContext) -> Result<()> {
        self.validate()?;
        self.last_updated = Utc::now();
        io::write_json(&ctx.foundation_path(), self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(FspecError::SchemaValidation {
                file: "foundation.json".to_string(),
                reason: "projectName must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
