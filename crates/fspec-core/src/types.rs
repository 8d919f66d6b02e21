use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// WorkUnitStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkUnitStatus {
    Backlog,
    Specifying,
    Testing,
    Implementing,
    Validating,
    Done,
    Blocked,
}

impl WorkUnitStatus {
    pub fn all() -> &'static [WorkUnitStatus] {
        &[
            WorkUnitStatus::Backlog,
            WorkUnitStatus::Specifying,
            WorkUnitStatus::Testing,
            WorkUnitStatus::Implementing,
            WorkUnitStatus::Validating,
            WorkUnitStatus::Done,
            WorkUnitStatus::Blocked,
        ]
    }

    /// States that represent active development. Entering one of these is
    /// gated on unresolved blockers.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            WorkUnitStatus::Specifying
                | WorkUnitStatus::Testing
                | WorkUnitStatus::Implementing
                | WorkUnitStatus::Validating
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkUnitStatus::Backlog => "backlog",
            WorkUnitStatus::Specifying => "specifying",
            WorkUnitStatus::Testing => "testing",
            WorkUnitStatus::Implementing => "implementing",
            WorkUnitStatus::Validating => "validating",
            WorkUnitStatus::Done => "done",
            WorkUnitStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for WorkUnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkUnitStatus {
    type Err = crate::error::FspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(WorkUnitStatus::Backlog),
            "specifying" => Ok(WorkUnitStatus::Specifying),
            "testing" => Ok(WorkUnitStatus::Testing),
            "implementing" => Ok(WorkUnitStatus::Implementing),
            "validating" => Ok(WorkUnitStatus::Validating),
            "done" => Ok(WorkUnitStatus::Done),
            "blocked" => Ok(WorkUnitStatus::Blocked),
            _ => Err(crate::error::FspecError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkUnitType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkUnitType {
    Story,
    Bug,
    Task,
}

impl WorkUnitType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkUnitType::Story => "story",
            WorkUnitType::Bug => "bug",
            WorkUnitType::Task => "task",
        }
    }
}

impl fmt::Display for WorkUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkUnitType {
    type Err = crate::error::FspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(WorkUnitType::Story),
            "bug" => Ok(WorkUnitType::Bug),
            "task" => Ok(WorkUnitType::Task),
            _ => Err(crate::error::FspecError::InvalidType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RelationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    Blocks,
    BlockedBy,
    DependsOn,
    RelatesTo,
}

impl RelationKind {
    pub fn all() -> &'static [RelationKind] {
        &[
            RelationKind::Blocks,
            RelationKind::BlockedBy,
            RelationKind::DependsOn,
            RelationKind::RelatesTo,
        ]
    }

    /// The kind written on the target side, if this kind is mirrored.
    /// `dependsOn` is directional and has no mirror.
    pub fn mirror(self) -> Option<RelationKind> {
        match self {
            RelationKind::Blocks => Some(RelationKind::BlockedBy),
            RelationKind::BlockedBy => Some(RelationKind::Blocks),
            RelationKind::RelatesTo => Some(RelationKind::RelatesTo),
            RelationKind::DependsOn => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Blocks => "blocks",
            RelationKind::BlockedBy => "blockedBy",
            RelationKind::DependsOn => "dependsOn",
            RelationKind::RelatesTo => "relatesTo",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = crate::error::FspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(RelationKind::Blocks),
            "blockedBy" | "blocked-by" => Ok(RelationKind::BlockedBy),
            "dependsOn" | "depends-on" => Ok(RelationKind::DependsOn),
            "relatesTo" | "relates-to" => Ok(RelationKind::RelatesTo),
            _ => Err(crate::error::FspecError::InvalidRelation(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EventStormLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStormLevel {
    BigPicture,
    ProcessModeling,
    SoftwareDesign,
}

impl EventStormLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStormLevel::BigPicture => "big_picture",
            EventStormLevel::ProcessModeling => "process_modeling",
            EventStormLevel::SoftwareDesign => "software_design",
        }
    }
}

impl fmt::Display for EventStormLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStormLevel {
    type Err = crate::error::FspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "big_picture" | "big-picture" => Ok(EventStormLevel::BigPicture),
            "process_modeling" | "process-modeling" => Ok(EventStormLevel::ProcessModeling),
            "software_design" | "software-design" => Ok(EventStormLevel::SoftwareDesign),
            _ => Err(crate::error::FspecError::InvalidLevel(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
