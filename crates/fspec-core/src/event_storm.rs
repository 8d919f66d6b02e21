use crate::collection::SoftDeletable;
use crate::types::EventStormLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ItemCommon
// ---------------------------------------------------------------------------

/// Fields shared by every event storm item, flattened into each variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCommon {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ItemCommon {
    fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventStormItem
// ---------------------------------------------------------------------------

/// Closed tagged union over the event storm item kinds. The `type` tag is
/// the discriminator on disk; consumption sites match exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventStormItem {
    Event {
        #[serde(flatten)]
        common: ItemCommon,
    },
    Command {
        #[serde(flatten)]
        common: ItemCommon,
        /// The actor issuing the command, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor: Option<String>,
    },
    Policy {
        #[serde(flatten)]
        common: ItemCommon,
    },
    Hotspot {
        #[serde(flatten)]
        common: ItemCommon,
    },
    Aggregate {
        #[serde(flatten)]
        common: ItemCommon,
    },
    BoundedContext {
        #[serde(flatten)]
        common: ItemCommon,
    },
    ExternalSystem {
        #[serde(flatten)]
        common: ItemCommon,
    },
}

impl EventStormItem {
    pub fn new(kind: EventStormItemKind, text: impl Into<String>) -> Self {
        let common = ItemCommon::new(text);
        match kind {
            EventStormItemKind::Event => EventStormItem::Event { common },
            EventStormItemKind::Command => EventStormItem::Command {
                common,
                actor: None,
            },
            EventStormItemKind::Policy => EventStormItem::Policy { common },
            EventStormItemKind::Hotspot => EventStormItem::Hotspot { common },
            EventStormItemKind::Aggregate => EventStormItem::Aggregate { common },
            EventStormItemKind::BoundedContext => EventStormItem::BoundedContext { common },
            EventStormItemKind::ExternalSystem => EventStormItem::ExternalSystem { common },
        }
    }

    pub fn common(&self) -> &ItemCommon {
        match self {
            EventStormItem::Event { common }
            | EventStormItem::Command { common, .. }
            | EventStormItem::Policy { common }
            | EventStormItem::Hotspot { common }
            | EventStormItem::Aggregate { common }
            | EventStormItem::BoundedContext { common }
            | EventStormItem::ExternalSystem { common } => common,
        }
    }

    fn common_mut(&mut self) -> &mut ItemCommon {
        match self {
            EventStormItem::Event { common }
            | EventStormItem::Command { common, .. }
            | EventStormItem::Policy { common }
            | EventStormItem::Hotspot { common }
            | EventStormItem::Aggregate { common }
            | EventStormItem::BoundedContext { common }
            | EventStormItem::ExternalSystem { common } => common,
        }
    }

    pub fn kind(&self) -> EventStormItemKind {
        match self {
            EventStormItem::Event { .. } => EventStormItemKind::Event,
            EventStormItem::Command { .. } => EventStormItemKind::Command,
            EventStormItem::Policy { .. } => EventStormItemKind::Policy,
            EventStormItem::Hotspot { .. } => EventStormItemKind::Hotspot,
            EventStormItem::Aggregate { .. } => EventStormItemKind::Aggregate,
            EventStormItem::BoundedContext { .. } => EventStormItemKind::BoundedContext,
            EventStormItem::ExternalSystem { .. } => EventStormItemKind::ExternalSystem,
        }
    }
}

impl SoftDeletable for EventStormItem {
    fn item_id(&self) -> u32 {
        self.common().id
    }
    fn set_item_id(&mut self, id: u32) {
        self.common_mut().id = id;
    }
    fn is_deleted(&self) -> bool {
        self.common().deleted
    }
    fn set_deleted(&mut self, deleted_at: Option<DateTime<Utc>>) {
        let common = self.common_mut();
        common.deleted = deleted_at.is_some();
        common.deleted_at = deleted_at;
    }
}

// ---------------------------------------------------------------------------
// EventStormItemKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStormItemKind {
    Event,
    Command,
    Policy,
    Hotspot,
    Aggregate,
    BoundedContext,
    ExternalSystem,
}

impl EventStormItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStormItemKind::Event => "event",
            EventStormItemKind::Command => "command",
            EventStormItemKind::Policy => "policy",
            EventStormItemKind::Hotspot => "hotspot",
            EventStormItemKind::Aggregate => "aggregate",
            EventStormItemKind::BoundedContext => "bounded_context",
            EventStormItemKind::ExternalSystem => "external_system",
        }
    }
}

impl fmt::Display for EventStormItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStormItemKind {
    type Err = crate::error::FspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(EventStormItemKind::Event),
            "command" => Ok(EventStormItemKind::Command),
            "policy" => Ok(EventStormItemKind::Policy),
            "hotspot" => Ok(EventStormItemKind::Hotspot),
            "aggregate" => Ok(EventStormItemKind::Aggregate),
            "bounded_context" | "bounded-context" => Ok(EventStormItemKind::BoundedContext),
            "external_system" | "external-system" => Ok(EventStormItemKind::ExternalSystem),
            _ => Err(crate::error::FspecError::InvalidItemKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EventStorm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStorm {
    pub level: EventStormLevel,
    #[serde(default)]
    pub items: Vec<EventStormItem>,
    #[serde(default)]
    pub next_item_id: u32,
}

impl EventStorm {
    pub fn new(level: EventStormLevel) -> Self {
        Self {
            level,
            items: Vec::new(),
            next_item_id: 0,
        }
    }

    pub fn add(&mut self, kind: EventStormItemKind, text: impl Into<String>) -> u32 {
        crate::collection::append(
            &mut self.items,
            EventStormItem::new(kind, text),
            &mut self.next_item_id,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
