use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Common behavior for soft-deletable, stably-ID'd collection items.
///
/// Items are identified by a stable integer `id` assigned from a
/// per-collection monotonic counter, never by array position. Removal is a
/// soft delete; compaction is the only operation that physically drops
/// items and renumbers the survivors.
pub trait SoftDeletable {
    fn item_id(&self) -> u32;
    fn set_item_id(&mut self, id: u32);
    fn is_deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted_at: Option<DateTime<Utc>>);
}

/// Outcome of an idempotent soft-delete or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Changed,
    /// The item was already in the requested state; nothing was modified.
    NoOp,
}

/// Append `item`, assigning it the next stable ID from `next_id`.
pub fn append<T: SoftDeletable>(items: &mut Vec<T>, mut item: T, next_id: &mut u32) -> u32 {
    let id = *next_id;
    item.set_item_id(id);
    *next_id += 1;
    items.push(item);
    id
}

pub fn find<T: SoftDeletable>(items: &[T], id: u32) -> Option<&T> {
    items.iter().find(|i| i.item_id() == id)
}

pub fn find_mut<T: SoftDeletable>(items: &mut [T], id: u32) -> Option<&mut T> {
    items.iter_mut().find(|i| i.item_id() == id)
}

/// Soft-delete by stable ID. Deleting an already-deleted item is a no-op.
pub fn soft_delete<T: SoftDeletable>(
    items: &mut [T],
    id: u32,
    collection: &'static str,
) -> crate::Result<ItemChange> {
    let item = find_mut(items, id).ok_or(crate::FspecError::ItemNotFound { collection, id })?;
    if item.is_deleted() {
        return Ok(ItemChange::NoOp);
    }
    item.set_deleted(Some(Utc::now()));
    Ok(ItemChange::Changed)
}

/// Restore by stable ID. Restoring an already-active item is a no-op.
pub fn restore<T: SoftDeletable>(
    items: &mut [T],
    id: u32,
    collection: &'static str,
) -> crate::Result<ItemChange> {
    let item = find_mut(items, id).ok_or(crate::FspecError::ItemNotFound { collection, id })?;
    if !item.is_deleted() {
        return Ok(ItemChange::NoOp);
    }
    item.set_deleted(None);
    Ok(ItemChange::Changed)
}

/// Permanently drop deleted items, renumber survivors to `0..n-1` in their
/// current order, and reset the counter to `n`. Irreversible.
pub fn compact<T: SoftDeletable>(items: &mut Vec<T>, next_id: &mut u32) -> usize {
    let before = items.len();
    items.retain(|i| !i.is_deleted());
    for (i, item) in items.iter_mut().enumerate() {
        item.set_item_id(i as u32);
    }
    *next_id = items.len() as u32;
    before - items.len()
}

/// Implements [`SoftDeletable`] plus serde for a plain item struct with the
/// standard `id`/`deleted`/`createdAt`/`deletedAt` fields.
macro_rules! soft_deletable {
    ($ty:ty) => {
        impl SoftDeletable for $ty {
            fn item_id(&self) -> u32 {
                self.id
            }
            fn set_item_id(&mut self, id: u32) {
                self.id = id;
            }
            fn is_deleted(&self) -> bool {
                self.deleted
            }
            fn set_deleted(&mut self, deleted_at: Option<DateTime<Utc>>) {
                self.deleted = deleted_at.is_some();
                self.deleted_at = deleted_at;
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Example-mapping item types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Rule {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

soft_deletable!(Rule);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub id: u32,
    pub text: String,
    /// Stable ID of the rule this example illustrates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<u32>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Example {
    pub fn new(text: impl Into<String>, rule_id: Option<u32>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            rule_id,
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

soft_deletable!(Example);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            answer: None,
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

soft_deletable!(Question);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumption {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Assumption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

soft_deletable!(Assumption);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureNote {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ArchitectureNote {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: 0,
            text: text.into(),
            deleted: false,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

soft_deletable!(ArchitectureNote);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_monotonic_ids() {
        let mut rules: Vec<Rule> = Vec::new();
        let mut next_id = 0;
        assert_eq!(append(&mut rules, Rule::new("a"), &mut next_id), 0);
        assert_eq!(append(&mut rules, Rule::new("b"), &mut next_id), 1);
        assert_eq!(append(&mut rules, Rule::new("c"), &mut next_id), 2);
        assert_eq!(next_id, 3);
    }

    #[test]
    fn soft_delete_and_restore_idempotent() {
        let mut rules: Vec<Rule> = Vec::new();
        let mut next_id = 0;
        let id = append(&mut rules, Rule::new("a"), &mut next_id);

        assert_eq!(
            soft_delete(&mut rules, id, "rules").unwrap(),
            ItemChange::Changed
        );
        assert!(rules[0].deleted);
        assert!(rules[0].deleted_at.is_some());

        // Second delete is a no-op, not an error
        assert_eq!(
            soft_delete(&mut rules, id, "rules").unwrap(),
            ItemChange::NoOp
        );

        assert_eq!(restore(&mut rules, id, "rules").unwrap(), ItemChange::Changed);
        assert!(!rules[0].deleted);
        assert!(rules[0].deleted_at.is_none());
        assert_eq!(restore(&mut rules, id, "rules").unwrap(), ItemChange::NoOp);
    }

    #[test]
    fn delete_missing_item_fails() {
        let mut rules: Vec<Rule> = Vec::new();
        assert!(soft_delete(&mut rules, 9, "rules").is_err());
    }

    #[test]
    fn compact_renumbers_and_resets_counter() {
        let mut rules: Vec<Rule> = Vec::new();
        let mut next_id = 0;
        append(&mut rules, Rule::new("a"), &mut next_id);
        let b = append(&mut rules, Rule::new("b"), &mut next_id);
        append(&mut rules, Rule::new("c"), &mut next_id);

        soft_delete(&mut rules, b, "rules").unwrap();
        let dropped = compact(&mut rules, &mut next_id);
        assert_eq!(dropped, 1);

        // Survivors keep relative order and are renumbered from 0
        assert_eq!(rules.len(), 2);
        assert_eq!((rules[0].id, rules[0].text.as_str()), (0, "a"));
        assert_eq!((rules[1].id, rules[1].text.as_str()), (1, "c"));

        // Next append picks up id 2
        assert_eq!(append(&mut rules, Rule::new("d"), &mut next_id), 2);
    }

    #[test]
    fn question_answered_check() {
        let mut q = Question::new("what about SSO?");
        assert!(!q.is_answered());
        q.answer = Some("   ".to_string());
        assert!(!q.is_answered());
        q.answer = Some("out of scope".to_string());
        assert!(q.is_answered());
    }
}
