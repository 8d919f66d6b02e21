use crate::collection::{ArchitectureNote, Assumption, Example, Question, Rule};
use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::event_storm::EventStorm;
use crate::io;
use crate::types::{WorkUnitStatus, WorkUnitType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// StateHistoryEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub state: WorkUnitStatus,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WorkUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkUnitStatus,
    /// Immutable once set. Attempts to change it fail.
    #[serde(rename = "type")]
    pub unit_type: WorkUnitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,

    // Relationship edges. A unit with no edges of a kind has no key for
    // that kind on disk, never an empty array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relates_to: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,

    /// Stem of this unit's Gherkin feature file under spec/features/, set
    /// when the file is scaffolded. Used for temporal-ordering checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_file: Option<String>,
    /// Path (relative to the project root) of the test artifact expected
    /// before entering implementing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_artifact: Option<String>,

    /// Append-only log, one entry per transition.
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Example-mapping collections, soft-deletable with stable IDs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub next_rule_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub next_example_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub next_question_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assumptions: Vec<Assumption>,
    #[serde(default)]
    pub next_assumption_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architecture_notes: Vec<ArchitectureNote>,
    #[serde(default)]
    pub next_note_id: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_storm: Option<EventStorm>,
}

impl WorkUnit {
    pub fn new(id: impl Into<String>, title: impl Into<String>, unit_type: WorkUnitType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: WorkUnitStatus::Backlog,
            unit_type,
            epic: None,
            parent: None,
            children: None,
            blocks: None,
            blocked_by: None,
            depends_on: None,
            relates_to: None,
            blocked_reason: None,
            feature_file: None,
            test_artifact: None,
            state_history: vec![StateHistoryEntry {
                state: WorkUnitStatus::Backlog,
                timestamp: now,
            }],
            created_at: now,
            updated_at: now,
            rules: Vec::new(),
            next_rule_id: 0,
            examples: Vec::new(),
            next_example_id: 0,
            questions: Vec::new(),
            next_question_id: 0,
            assumptions: Vec::new(),
            next_assumption_id: 0,
            architecture_notes: Vec::new(),
            next_note_id: 0,
            event_storm: None,
        }
    }

    /// Timestamp of the most recent entry into `state`, if the unit has
    /// ever been there.
    pub fn entered_at(&self, state: WorkUnitStatus) -> Option<DateTime<Utc>> {
        self.state_history
            .iter()
            .rev()
            .find(|e| e.state == state)
            .map(|e| e.timestamp)
    }

    pub fn edges(&self, kind: crate::types::RelationKind) -> &Option<Vec<String>> {
        use crate::types::RelationKind;
        match kind {
            RelationKind::Blocks => &self.blocks,
            RelationKind::BlockedBy => &self.blocked_by,
            RelationKind::DependsOn => &self.depends_on,
            RelationKind::RelatesTo => &self.relates_to,
        }
    }

    pub fn edges_mut(&mut self, kind: crate::types::RelationKind) -> &mut Option<Vec<String>> {
        use crate::types::RelationKind;
        match kind {
            RelationKind::Blocks => &mut self.blocks,
            RelationKind::BlockedBy => &mut self.blocked_by,
            RelationKind::DependsOn => &mut self.depends_on,
            RelationKind::RelatesTo => &mut self.relates_to,
        }
    }

    /// True iff the unit has neither an epic assignment nor any
    /// relationship of any kind.
    pub fn is_orphaned(&self) -> bool {
        self.epic.is_none()
            && crate::types::RelationKind::all()
                .iter()
                .all(|&k| self.edges(k).as_ref().is_none_or(|v| v.is_empty()))
    }

    pub fn set_type(&mut self, unit_type: WorkUnitType) -> Result<bool> {
        if self.unit_type == unit_type {
            return Ok(false);
        }
        Err(FspecError::ImmutableType {
            id: self.id.clone(),
            current: self.unit_type.to_string(),
        })
    }

    /// Compaction destroys soft-deleted history, so it is only permitted
    /// once the unit is done. `force` overrides; the caller warns.
    pub fn ensure_compactable(&self, force: bool) -> Result<()> {
        if self.status == WorkUnitStatus::Done || force {
            return Ok(());
        }
        Err(FspecError::CompactionNotAllowed {
            id: self.id.clone(),
            status: self.status.to_string(),
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// WorkUnitsData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default = "default_version")]
    pub version: u32,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

/// Root document of spec/work-units.json.
///
/// `states` is a denormalized secondary index; every unit ID appears in
/// exactly one bucket, matching `work_units[id].status`. Drift between the
/// two is an integrity defect that `graph::repair` restores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnitsData {
    pub meta: Meta,
    #[serde(default)]
    pub states: BTreeMap<WorkUnitStatus, Vec<String>>,
    #[serde(default)]
    pub work_units: BTreeMap<String, WorkUnit>,
}

impl Default for WorkUnitsData {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkUnitsData {
    pub fn new() -> Self {
        Self {
            meta: Meta {
                version: 1,
                last_updated: Utc::now(),
            },
            states: BTreeMap::new(),
            work_units: BTreeMap::new(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(ctx: &ProjectContext) -> Result<Self> {
        let path = ctx.work_units_path();
        if !path.exists() {
            return Err(FspecError::NotInitialized);
        }
        let data: WorkUnitsData = io::read_json(&path)?;
        crate::migrations::migrate_work_units(data)
    }

    pub fn save(&mut self, ctx: &ProjectContext) -> Result<()> {
        self.meta.last_updated = Utc::now();
        io::write_json(&ctx.work_units_path(), self)
    }

    // ---------------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Result<&WorkUnit> {
        self.work_units
            .get(id)
            .ok_or_else(|| FspecError::WorkUnitNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut WorkUnit> {
        self.work_units
            .get_mut(id)
            .ok_or_else(|| FspecError::WorkUnitNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.work_units.contains_key(id)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Insert a freshly created unit and index it under its status. An
    /// already-present ID is refused rather than overwritten: IDs come from
    /// the prefix registry's monotonic sequence, so a collision means the
    /// registry and this document are out of sync.
    pub fn insert(&mut self, unit: WorkUnit) -> Result<()> {
        if self.work_units.contains_key(&unit.id) {
            return Err(FspecError::WorkUnitExists(unit.id.clone()));
        }
        self.index_insert(unit.status, &unit.id);
        self.work_units.insert(unit.id.clone(), unit);
        Ok(())
    }

    pub fn index_insert(&mut self, status: WorkUnitStatus, id: &str) {
        let bucket = self.states.entry(status).or_default();
        if !bucket.iter().any(|x| x == id) {
            bucket.push(id.to_string());
        }
    }

    pub fn index_remove(&mut self, status: WorkUnitStatus, id: &str) {
        if let Some(bucket) = self.states.get_mut(&status) {
            bucket.retain(|x| x != id);
            if bucket.is_empty() {
                self.states.remove(&status);
            }
        }
    }

    /// The status bucket an ID is currently indexed under, if any.
    pub fn indexed_status(&self, id: &str) -> Option<WorkUnitStatus> {
        self.states
            .iter()
            .find(|(_, ids)| ids.iter().any(|x| x == id))
            .map(|(s, _)| *s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_unit_starts_in_backlog() {
        let unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        assert_eq!(unit.status, WorkUnitStatus::Backlog);
        assert_eq!(unit.state_history.len(), 1);
        assert_eq!(unit.state_history[0].state, WorkUnitStatus::Backlog);
    }

    #[test]
    fn type_is_immutable() {
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        // Same type is a no-op
        assert!(!unit.set_type(WorkUnitType::Story).unwrap());
        // Different type fails
        assert!(matches!(
            unit.set_type(WorkUnitType::Bug),
            Err(FspecError::ImmutableType { .. })
        ));
        assert_eq!(unit.unit_type, WorkUnitType::Story);
    }

    #[test]
    fn insert_refuses_duplicate_id() {
        let mut data = WorkUnitsData::new();
        data.insert(WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story))
            .unwrap();

        // A colliding ID must not silently replace the existing unit
        assert!(matches!(
            data.insert(WorkUnit::new("AUTH-001", "Logout", WorkUnitType::Story)),
            Err(FspecError::WorkUnitExists(_))
        ));
        assert_eq!(data.get("AUTH-001").unwrap().title, "Login");
    }

    #[test]
    fn orphan_requires_no_epic_and_no_edges() {
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        assert!(unit.is_orphaned());

        // An epic alone de-orphans
        unit.epic = Some("auth".to_string());
        assert!(!unit.is_orphaned());

        // A relationship alone de-orphans too
        unit.epic = None;
        unit.depends_on = Some(vec!["AUTH-002".to_string()]);
        assert!(!unit.is_orphaned());
    }

    #[test]
    fn roundtrip_omits_empty_relationship_keys() {
        let unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        let json = serde_json::to_value(&unit).unwrap();
        assert!(json.get("blocks").is_none());
        assert!(json.get("blockedBy").is_none());
        assert!(json.get("dependsOn").is_none());
        assert!(json.get("relatesTo").is_none());
        assert_eq!(json["type"], "story");
        assert_eq!(json["status"], "backlog");
    }

    #[test]
    fn data_load_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());

        let mut data = WorkUnitsData::new();
        data.insert(WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story)).unwrap();
        data.save(&ctx).unwrap();

        let loaded = WorkUnitsData::load(&ctx).unwrap();
        assert!(loaded.contains("AUTH-001"));
        assert_eq!(
            loaded.indexed_status("AUTH-001"),
            Some(WorkUnitStatus::Backlog)
        );
    }

    #[test]
    fn load_uninitialized_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        assert!(matches!(
            WorkUnitsData::load(&ctx),
            Err(FspecError::NotInitialized)
        ));
    }

    #[test]
    fn index_remove_drops_empty_buckets() {
        let mut data = WorkUnitsData::new();
        data.insert(WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story)).unwrap();
        data.index_remove(WorkUnitStatus::Backlog, "AUTH-001");
        assert!(data.states.get(&WorkUnitStatus::Backlog).is_none());
    }

    #[test]
    fn compaction_gated_on_done() {
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        assert!(matches!(
            unit.ensure_compactable(false),
            Err(FspecError::CompactionNotAllowed { .. })
        ));
        assert!(unit.ensure_compactable(true).is_ok());
        unit.status = WorkUnitStatus::Done;
        assert!(unit.ensure_compactable(false).is_ok());
    }

    #[test]
    fn entered_at_finds_latest_entry() {
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        let t1 = Utc::now();
        unit.state_history.push(StateHistoryEntry {
            state: WorkUnitStatus::Specifying,
            timestamp: t1,
        });
        let t2 = Utc::now();
        unit.state_history.push(StateHistoryEntry {
            state: WorkUnitStatus::Specifying,
            timestamp: t2,
        });
        assert_eq!(unit.entered_at(WorkUnitStatus::Specifying), Some(t2));
        assert_eq!(unit.entered_at(WorkUnitStatus::Done), None);
    }
}
