use crate::error::{FspecError, Result};
use crate::types::{RelationKind, WorkUnitStatus};
use crate::workunit::WorkUnitsData;
use serde::Serialize;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Edge helpers
// ---------------------------------------------------------------------------

/// Add `target` to an optional edge vector. Returns false if already present.
fn push_edge(edges: &mut Option<Vec<String>>, target: &str) -> bool {
    let vec = edges.get_or_insert_with(Vec::new);
    if vec.iter().any(|x| x == target) {
        return false;
    }
    vec.push(target.to_string());
    true
}

/// Remove `target` from an optional edge vector, dropping the key entirely
/// when it empties. Returns false if the edge was not present.
fn remove_edge(edges: &mut Option<Vec<String>>, target: &str) -> bool {
    let Some(vec) = edges.as_mut() else {
        return false;
    };
    let before = vec.len();
    vec.retain(|x| x != target);
    let removed = vec.len() < before;
    if vec.is_empty() {
        *edges = None;
    }
    removed
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Write the edge `(id, kind, target)` plus its mirror in one operation.
/// Duplicate edges are idempotent no-ops; returns true if anything changed.
pub fn add_relation(
    data: &mut WorkUnitsData,
    id: &str,
    kind: RelationKind,
    target: &str,
) -> Result<bool> {
    if id == target {
        return Err(FspecError::SelfRelation(id.to_string()));
    }
    data.get(id)?;
    data.get(target)?;

    let mut changed = push_edge(data.get_mut(id)?.edges_mut(kind), target);
    if let Some(mirror) = kind.mirror() {
        changed |= push_edge(data.get_mut(target)?.edges_mut(mirror), id);
    }
    if changed {
        data.get_mut(id)?.touch();
    }
    Ok(changed)
}

/// Remove the edge and its mirror. Removing an absent edge is a no-op.
pub fn remove_relation(
    data: &mut WorkUnitsData,
    id: &str,
    kind: RelationKind,
    target: &str,
) -> Result<bool> {
    data.get(id)?;

    let mut changed = remove_edge(data.get_mut(id)?.edges_mut(kind), target);
    if let Some(mirror) = kind.mirror() {
        if let Ok(other) = data.get_mut(target) {
            changed |= remove_edge(other.edges_mut(mirror), id);
        }
    }
    if changed {
        data.get_mut(id)?.touch();
    }
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Parent / child
// ---------------------------------------------------------------------------

/// Set `id`'s parent, maintaining the parent's `children` vector.
///
/// Fails on self-parenting and on any proposed parent whose ancestor chain
/// contains `id`. The walk carries a visited set so a pre-existing corrupt
/// cycle cannot loop forever.
pub fn set_parent(data: &mut WorkUnitsData, id: &str, parent_id: &str) -> Result<()> {
    data.get(parent_id)?;
    if id == parent_id {
        return Err(FspecError::CircularReference {
            id: id.to_string(),
            parent: parent_id.to_string(),
        });
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id {
            return Err(FspecError::CircularReference {
                id: id.to_string(),
                parent: parent_id.to_string(),
            });
        }
        if !visited.insert(current) {
            break;
        }
        cursor = data
            .work_units
            .get(current)
            .and_then(|u| u.parent.as_deref());
    }

    let old_parent = data.get(id)?.parent.clone();
    if let Some(old) = old_parent {
        if let Ok(unit) = data.get_mut(&old) {
            remove_edge(&mut unit.children, id);
        }
    }

    push_edge(&mut data.get_mut(parent_id)?.children, id);
    let unit = data.get_mut(id)?;
    unit.parent = Some(parent_id.to_string());
    unit.touch();
    Ok(())
}

pub fn clear_parent(data: &mut WorkUnitsData, id: &str) -> Result<bool> {
    let Some(old) = data.get(id)?.parent.clone() else {
        return Ok(false);
    };
    if let Ok(parent) = data.get_mut(&old) {
        remove_edge(&mut parent.children, id);
    }
    let unit = data.get_mut(id)?;
    unit.parent = None;
    unit.touch();
    Ok(true)
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// One fix applied by [`repair`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RepairAction {
    /// The ID was indexed under the wrong status bucket (or not at all).
    Reindexed {
        id: String,
        from: Option<WorkUnitStatus>,
        to: WorkUnitStatus,
    },
    /// A mirror edge required by the bidirectionality invariant was absent.
    MirrorAdded {
        id: String,
        kind: RelationKind,
        target: String,
    },
    /// An edge referenced a work unit ID that no longer exists.
    DanglingDropped {
        id: String,
        kind: RelationKind,
        target: String,
    },
}

/// Full-document integrity scan.
///
/// Rebuilds the `states` index from each unit's authoritative `status`,
/// re-derives missing mirror edges for `blocks`/`blockedBy` and
/// `relatesTo`, and drops edges pointing at nonexistent IDs. Idempotent: a
/// second run reports zero actions. Never removes a valid relationship.
pub fn repair(data: &mut WorkUnitsData) -> Vec<RepairAction> {
    let mut actions = Vec::new();
    let ids: Vec<String> = data.work_units.keys().cloned().collect();
    let known: HashSet<String> = ids.iter().cloned().collect();

    // Dangling edges first, so mirror derivation only sees live IDs.
    for id in &ids {
        let unit = data.work_units.get_mut(id).expect("id from keys");
        for &kind in RelationKind::all() {
            let edges = unit.edges_mut(kind);
            let dangling: Vec<String> = edges
                .iter()
                .flatten()
                .filter(|t| !known.contains(*t))
                .cloned()
                .collect();
            for target in dangling {
                remove_edge(edges, &target);
                actions.push(RepairAction::DanglingDropped {
                    id: id.clone(),
                    kind,
                    target,
                });
            }
        }
    }

    // Missing mirror edges.
    for id in &ids {
        for &kind in &[
            RelationKind::Blocks,
            RelationKind::BlockedBy,
            RelationKind::RelatesTo,
        ] {
            let mirror = kind.mirror().expect("mirrored kinds only");
            let targets: Vec<String> = data
                .work_units
                .get(id)
                .and_then(|u| u.edges(kind).clone())
                .unwrap_or_default();
            for target in targets {
                let other = data.work_units.get_mut(&target).expect("dangling dropped");
                if push_edge(other.edges_mut(mirror), id) {
                    actions.push(RepairAction::MirrorAdded {
                        id: target,
                        kind: mirror,
                        target: id.clone(),
                    });
                }
            }
        }
    }

    // Rebuild the states index from the authoritative status field.
    for id in &ids {
        let status = data.work_units.get(id).expect("id from keys").status;
        let indexed = data.indexed_status(id);
        if indexed != Some(status) {
            if let Some(old) = indexed {
                data.index_remove(old, id);
            }
            data.index_insert(status, id);
            actions.push(RepairAction::Reindexed {
                id: id.clone(),
                from: indexed,
                to: status,
            });
        }
    }
    // Drop index entries for IDs that no longer exist.
    let stale: Vec<(WorkUnitStatus, String)> = data
        .states
        .iter()
        .flat_map(|(s, ids)| ids.iter().map(|i| (*s, i.clone())))
        .filter(|(_, i)| !known.contains(i))
        .collect();
    for (status, id) in stale {
        data.index_remove(status, &id);
        actions.push(RepairAction::Reindexed {
            id,
            from: Some(status),
            to: status,
        });
    }

    actions
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub id: String,
    /// Count of units directly or transitively blocked via `blocks` edges.
    pub score: usize,
}

/// Report non-done, non-blocked units whose bottleneck score is at least 2,
/// sorted descending by score. `dependsOn` edges are not counted.
pub fn bottlenecks(data: &WorkUnitsData) -> Vec<Bottleneck> {
    let mut out: Vec<Bottleneck> = data
        .work_units
        .values()
        .filter(|u| !matches!(u.status, WorkUnitStatus::Done | WorkUnitStatus::Blocked))
        .map(|u| Bottleneck {
            id: u.id.clone(),
            score: blocked_closure(data, &u.id),
        })
        .filter(|b| b.score >= 2)
        .collect();
    out.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    out
}

/// Size of the transitive closure over `blocks` edges, excluding the unit
/// itself. Cycle-safe via the visited set.
fn blocked_closure(data: &WorkUnitsData, id: &str) -> usize {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    if let Some(unit) = data.work_units.get(id) {
        stack.extend(unit.blocks.iter().flatten().map(String::as_str));
    }
    while let Some(current) = stack.pop() {
        if current == id || !visited.insert(current) {
            continue;
        }
        if let Some(unit) = data.work_units.get(current) {
            stack.extend(unit.blocks.iter().flatten().map(String::as_str));
        }
    }
    visited.len()
}

/// Units with no epic assignment and no relationship of any kind.
pub fn orphans(data: &WorkUnitsData) -> Vec<&crate::workunit::WorkUnit> {
    data.work_units
        .values()
        .filter(|u| u.is_orphaned())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkUnitType;
    use crate::workunit::WorkUnit;

    fn data_with(ids: &[&str]) -> WorkUnitsData {
        let mut data = WorkUnitsData::new();
        for id in ids {
            data.insert(WorkUnit::new(*id, format!("Unit {id}"), WorkUnitType::Story))
                .unwrap();
        }
        data
    }

    #[test]
    fn blocks_writes_mirror() {
        let mut data = data_with(&["AUTH-001", "AUTH-002"]);
        assert!(add_relation(&mut data, "AUTH-001", RelationKind::Blocks, "AUTH-002").unwrap());

        assert_eq!(
            data.get("AUTH-001").unwrap().blocks.as_deref(),
            Some(&["AUTH-002".to_string()][..])
        );
        assert_eq!(
            data.get("AUTH-002").unwrap().blocked_by.as_deref(),
            Some(&["AUTH-001".to_string()][..])
        );

        // Duplicate add is a no-op
        assert!(!add_relation(&mut data, "AUTH-001", RelationKind::Blocks, "AUTH-002").unwrap());
    }

    #[test]
    fn relates_to_is_symmetric() {
        let mut data = data_with(&["A-1", "A-2"]);
        add_relation(&mut data, "A-1", RelationKind::RelatesTo, "A-2").unwrap();
        assert!(data.get("A-2").unwrap().relates_to.is_some());

        remove_relation(&mut data, "A-2", RelationKind::RelatesTo, "A-1").unwrap();
        assert!(data.get("A-1").unwrap().relates_to.is_none());
        assert!(data.get("A-2").unwrap().relates_to.is_none());
    }

    #[test]
    fn depends_on_has_no_mirror() {
        let mut data = data_with(&["A-1", "A-2"]);
        add_relation(&mut data, "A-1", RelationKind::DependsOn, "A-2").unwrap();
        assert!(data.get("A-1").unwrap().depends_on.is_some());
        assert!(data.get("A-2").unwrap().depends_on.is_none());
        assert!(data.get("A-2").unwrap().blocked_by.is_none());
    }

    #[test]
    fn remove_drops_empty_vectors() {
        let mut data = data_with(&["A-1", "A-2"]);
        add_relation(&mut data, "A-1", RelationKind::Blocks, "A-2").unwrap();
        remove_relation(&mut data, "A-1", RelationKind::Blocks, "A-2").unwrap();

        // No empty arrays left behind, on either side
        assert!(data.get("A-1").unwrap().blocks.is_none());
        assert!(data.get("A-2").unwrap().blocked_by.is_none());
    }

    #[test]
    fn self_relation_rejected() {
        let mut data = data_with(&["A-1"]);
        assert!(matches!(
            add_relation(&mut data, "A-1", RelationKind::Blocks, "A-1"),
            Err(FspecError::SelfRelation(_))
        ));
    }

    #[test]
    fn relation_to_missing_unit_rejected() {
        let mut data = data_with(&["A-1"]);
        assert!(matches!(
            add_relation(&mut data, "A-1", RelationKind::Blocks, "A-9"),
            Err(FspecError::WorkUnitNotFound(_))
        ));
    }

    #[test]
    fn parent_cycle_rejected() {
        let mut data = data_with(&["A-1", "A-2", "A-3"]);
        set_parent(&mut data, "A-2", "A-1").unwrap();
        set_parent(&mut data, "A-3", "A-2").unwrap();

        // A-1 -> A-3 would close the loop
        let err = set_parent(&mut data, "A-1", "A-3").unwrap_err();
        assert!(matches!(err, FspecError::CircularReference { .. }));
        assert!(data.get("A-1").unwrap().parent.is_none());

        // Self-parenting rejected too
        assert!(set_parent(&mut data, "A-1", "A-1").is_err());
    }

    #[test]
    fn reparenting_moves_child_entry() {
        let mut data = data_with(&["A-1", "A-2", "A-3"]);
        set_parent(&mut data, "A-3", "A-1").unwrap();
        set_parent(&mut data, "A-3", "A-2").unwrap();

        assert!(data.get("A-1").unwrap().children.is_none());
        assert_eq!(
            data.get("A-2").unwrap().children.as_deref(),
            Some(&["A-3".to_string()][..])
        );
    }

    #[test]
    fn cycle_walk_survives_corrupt_data() {
        let mut data = data_with(&["A-1", "A-2", "A-3"]);
        // Pre-existing corruption: A-1 <-> A-2 parent cycle
        data.get_mut("A-1").unwrap().parent = Some("A-2".to_string());
        data.get_mut("A-2").unwrap().parent = Some("A-1".to_string());

        // Must terminate rather than loop forever
        set_parent(&mut data, "A-3", "A-1").unwrap();
        assert_eq!(data.get("A-3").unwrap().parent.as_deref(), Some("A-1"));
    }

    #[test]
    fn repair_restores_mirrors_and_index() {
        let mut data = data_with(&["A-1", "A-2"]);
        // Break both invariants by hand
        data.get_mut("A-1").unwrap().blocks = Some(vec!["A-2".to_string()]);
        data.get_mut("A-2").unwrap().status = WorkUnitStatus::Specifying; // index still says backlog

        let actions = repair(&mut data);
        assert!(actions.iter().any(|a| matches!(
            a,
            RepairAction::MirrorAdded { id, .. } if id == "A-2"
        )));
        assert!(actions.iter().any(|a| matches!(
            a,
            RepairAction::Reindexed { id, to: WorkUnitStatus::Specifying, .. } if id == "A-2"
        )));

        assert_eq!(
            data.get("A-2").unwrap().blocked_by.as_deref(),
            Some(&["A-1".to_string()][..])
        );
        assert_eq!(
            data.indexed_status("A-2"),
            Some(WorkUnitStatus::Specifying)
        );

        // Idempotent: a second run fixes nothing
        assert!(repair(&mut data).is_empty());
    }

    #[test]
    fn repair_drops_dangling_edges() {
        let mut data = data_with(&["A-1"]);
        data.get_mut("A-1").unwrap().blocks = Some(vec!["GONE-9".to_string()]);

        let actions = repair(&mut data);
        assert_eq!(
            actions,
            vec![RepairAction::DanglingDropped {
                id: "A-1".to_string(),
                kind: RelationKind::Blocks,
                target: "GONE-9".to_string(),
            }]
        );
        assert!(data.get("A-1").unwrap().blocks.is_none());
        assert!(repair(&mut data).is_empty());
    }

    #[test]
    fn repair_actions_serialize_with_action_tag() {
        // The discriminator must not collide with the `kind` edge field
        let action = RepairAction::DanglingDropped {
            id: "A-1".to_string(),
            kind: RelationKind::Blocks,
            target: "GONE-9".to_string(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "danglingDropped");
        assert_eq!(json["kind"], "blocks");
        assert_eq!(json["target"], "GONE-9");
    }

    #[test]
    fn repair_never_removes_valid_relationships() {
        let mut data = data_with(&["A-1", "A-2"]);
        add_relation(&mut data, "A-1", RelationKind::Blocks, "A-2").unwrap();
        add_relation(&mut data, "A-1", RelationKind::RelatesTo, "A-2").unwrap();

        assert!(repair(&mut data).is_empty());
        assert!(data.get("A-1").unwrap().blocks.is_some());
        assert!(data.get("A-2").unwrap().blocked_by.is_some());
        assert!(data.get("A-1").unwrap().relates_to.is_some());
    }

    #[test]
    fn bottleneck_counts_blocks_not_depends_on() {
        let mut data = data_with(&["AUTH-001", "AUTH-002", "AUTH-003"]);
        add_relation(&mut data, "AUTH-002", RelationKind::DependsOn, "AUTH-001").unwrap();

        // dependsOn does not contribute to the score
        assert!(bottlenecks(&data).is_empty());

        add_relation(&mut data, "AUTH-001", RelationKind::Blocks, "AUTH-002").unwrap();
        add_relation(&mut data, "AUTH-001", RelationKind::Blocks, "AUTH-003").unwrap();

        let report = bottlenecks(&data);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, "AUTH-001");
        assert_eq!(report[0].score, 2);
    }

    #[test]
    fn bottleneck_score_is_transitive_and_cycle_safe() {
        let mut data = data_with(&["A-1", "A-2", "A-3", "A-4"]);
        add_relation(&mut data, "A-1", RelationKind::Blocks, "A-2").unwrap();
        add_relation(&mut data, "A-2", RelationKind::Blocks, "A-3").unwrap();
        add_relation(&mut data, "A-3", RelationKind::Blocks, "A-4").unwrap();
        // Cycle back to the root
        add_relation(&mut data, "A-4", RelationKind::Blocks, "A-1").unwrap();

        let report = bottlenecks(&data);
        let a1 = report.iter().find(|b| b.id == "A-1").unwrap();
        assert_eq!(a1.score, 3);
    }

    #[test]
    fn done_and_blocked_units_are_not_bottlenecks() {
        let mut data = data_with(&["A-1", "A-2", "A-3"]);
        add_relation(&mut data, "A-1", RelationKind::Blocks, "A-2").unwrap();
        add_relation(&mut data, "A-1", RelationKind::Blocks, "A-3").unwrap();
        data.get_mut("A-1").unwrap().status = WorkUnitStatus::Done;

        assert!(bottlenecks(&data).is_empty());
    }

    #[test]
    fn orphans_require_no_epic_and_no_relations() {
        let mut data = data_with(&["A-1", "A-2", "A-3"]);
        add_relation(&mut data, "A-1", RelationKind::RelatesTo, "A-2").unwrap();
        data.get_mut("A-3").unwrap().epic = Some("auth".to_string());

        // A-1 and A-2 have relations, A-3 has an epic: no orphans
        assert!(orphans(&data).is_empty());

        remove_relation(&mut data, "A-1", RelationKind::RelatesTo, "A-2").unwrap();
        let found: Vec<&str> = orphans(&data).iter().map(|u| u.id.as_str()).collect();
        assert_eq!(found, vec!["A-1", "A-2"]);
    }
}
