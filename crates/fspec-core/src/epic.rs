use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::io;
use crate::workunit::WorkUnitsData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicsData {
    #[serde(default)]
    pub epics: BTreeMap<String, Epic>,
}

impl EpicsData {
    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let path = ctx.epics_path();
        if !path.exists() {
            return Err(FspecError::NotInitialized);
        }
        io::read_json(&path)
    }

    pub fn save(&self, ctx: &ProjectContext) -> Result<()> {
        io::write_json(&ctx.epics_path(), self)
    }

    pub fn create(
        &mut self,
        id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<()> {
        let id = id.into();
        if self.epics.contains_key(&id) {
            return Err(FspecError::EpicExists(id));
        }
        self.epics.insert(
            id,
            Epic {
                title: title.into(),
                description,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    pub fn ensure_exists(&self, id: &str) -> Result<()> {
        if !self.epics.contains_key(id) {
            return Err(FspecError::EpicNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete an epic. Fails while any work unit still references it.
    pub fn delete(&mut self, id: &str, work_units: &WorkUnitsData) -> Result<()> {
        self.ensure_exists(id)?;
        if let Some(unit) = work_units
            .work_units
            .values()
            .find(|u| u.epic.as_deref() == Some(id))
        {
            return Err(FspecError::EpicInUse {
                epic: id.to_string(),
                unit: unit.id.clone(),
            });
        }
        self.epics.remove(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
