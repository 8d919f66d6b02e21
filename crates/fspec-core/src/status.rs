use crate::context::ProjectContext;
use crate::error::{FspecError, Result};
use crate::feature_file;
use crate::types::WorkUnitStatus;
use crate::workunit::{StateHistoryEntry, WorkUnit, WorkUnitsData};
use chrono::Utc;

/// Flags carried by a transition request.
#[derive(Debug, Clone, Default)]
pub struct TransitionOptions {
    /// Required when the target is `blocked`.
    pub reason: Option<String>,
    /// Skip the artifact temporal-ordering checks (reverse-ACDD import).
    pub skip_artifact_check: bool,
}

/// Gate and record a status transition for one work unit.
///
/// All preconditions are checked before anything is mutated; on failure the
/// document is left untouched. On success the unit's `status` is updated, a
/// `stateHistory` entry is appended, the denormalized `states` index is
/// moved, and `updatedAt` is refreshed. The caller persists the document.
pub fn transition(
    ctx: &ProjectContext,
    data: &mut WorkUnitsData,
    id: &str,
    target: WorkUnitStatus,
    opts: &TransitionOptions,
) -> Result<()> {
    let unit = data.get(id)?;
    let from = unit.status;

    validate(ctx, data, unit, target, opts)?;

    let old_indexed = data.indexed_status(id).unwrap_or(from);
    data.index_remove(old_indexed, id);
    data.index_insert(target, id);

    let unit = data.get_mut(id)?;
    unit.status = target;
    unit.state_history.push(StateHistoryEntry {
        state: target,
        timestamp: Utc::now(),
    });
    if target == WorkUnitStatus::Blocked {
        unit.blocked_reason = opts.reason.clone();
    } else if from == WorkUnitStatus::Blocked {
        unit.blocked_reason = None;
    }
    unit.touch();
    Ok(())
}

fn validate(
    ctx: &ProjectContext,
    data: &WorkUnitsData,
    unit: &WorkUnit,
    target: WorkUnitStatus,
    opts: &TransitionOptions,
) -> Result<()> {
    if target == WorkUnitStatus::Blocked
        && opts.reason.as_deref().is_none_or(|r| r.trim().is_empty())
    {
        return Err(FspecError::BlockedReasonRequired);
    }

    if target.is_active() {
        check_blockers(data, unit)?;
    }

    if target == WorkUnitStatus::Testing {
        check_questions_answered(unit)?;
        if !opts.skip_artifact_check {
            check_feature_file(ctx, unit)?;
        }
    }

    if unit.status == WorkUnitStatus::Testing
        && target == WorkUnitStatus::Implementing
        && !opts.skip_artifact_check
    {
        check_test_artifact(ctx, unit)?;
    }

    // Backward transitions are otherwise unconditional: the machine is not
    // strictly forward-only.
    Ok(())
}

/// Entering any active state requires every `blockedBy` reference to point
/// at a `done` unit. Dangling references do not block; repair drops them.
fn check_blockers(data: &WorkUnitsData, unit: &WorkUnit) -> Result<()> {
    for blocker_id in unit.blocked_by.iter().flatten() {
        if let Some(blocker) = data.work_units.get(blocker_id) {
            if blocker.status != WorkUnitStatus::Done {
                return Err(FspecError::ActiveBlocker {
                    id: unit.id.clone(),
                    blocker: blocker_id.clone(),
                    blocker_status: blocker.status.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Every non-deleted example-mapping question must be answered before the
/// unit leaves specifying for testing.
fn check_questions_answered(unit: &WorkUnit) -> Result<()> {
    let open: Vec<u32> = unit
        .questions
        .iter()
        .filter(|q| !q.deleted && !q.is_answered())
        .map(|q| q.id)
        .collect();
    if open.is_empty() {
        Ok(())
    } else {
        Err(FspecError::UnansweredQuestions {
            id: unit.id.clone(),
            open,
        })
    }
}

/// The feature file must exist and have been modified after the unit
/// entered specifying (temporal ordering: the artifact for the state being
/// entered is created while in the prior state).
fn check_feature_file(ctx: &ProjectContext, unit: &WorkUnit) -> Result<()> {
    let stem = unit.feature_file.as_deref().ok_or_else(|| {
        FspecError::MissingArtifact {
            artifact: "feature file".to_string(),
            id: unit.id.clone(),
        }
    })?;
    let path = ctx.feature_file_path(stem);
    let modified = feature_file::modified_at(&path)?.ok_or_else(|| FspecError::MissingArtifact {
        artifact: "feature file".to_string(),
        id: unit.id.clone(),
    })?;
    if let Some(entered) = unit.entered_at(WorkUnitStatus::Specifying) {
        if modified < entered {
            return Err(FspecError::StaleArtifact {
                artifact: "feature file".to_string(),
                id: unit.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_test_artifact(ctx: &ProjectContext, unit: &WorkUnit) -> Result<()> {
    let rel = unit.test_artifact.as_deref().ok_or_else(|| {
        FspecError::MissingArtifact {
            artifact: "test artifact".to_string(),
            id: unit.id.clone(),
        }
    })?;
    let path = ctx.root().join(rel);
    let modified = feature_file::modified_at(&path)?.ok_or_else(|| FspecError::MissingArtifact {
        artifact: "test artifact".to_string(),
        id: unit.id.clone(),
    })?;
    if let Some(entered) = unit.entered_at(WorkUnitStatus::Testing) {
        if modified < entered {
            return Err(FspecError::StaleArtifact {
                artifact: "test artifact".to_string(),
                id: unit.id.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{self, Question};
    use crate::types::WorkUnitType;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProjectContext, WorkUnitsData) {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::new(dir.path());
        let mut data = WorkUnitsData::new();
        data.insert(WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story)).unwrap();
        (dir, ctx, data)
    }

    fn skip_artifacts() -> TransitionOptions {
        TransitionOptions {
            reason: None,
            skip_artifact_check: true,
        }
    }

    #[test]
    fn transition_updates_status_history_and_index() {
        let (_dir, ctx, mut data) = setup();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap();

        let unit = data.get("AUTH-001").unwrap();
        assert_eq!(unit.status, WorkUnitStatus::Specifying);
        assert_eq!(unit.state_history.len(), 2);
        assert_eq!(
            data.indexed_status("AUTH-001"),
            Some(WorkUnitStatus::Specifying)
        );
        assert!(data.states.get(&WorkUnitStatus::Backlog).is_none());
    }

    #[test]
    fn blocked_requires_reason() {
        let (_dir, ctx, mut data) = setup();
        let err = transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Blocked,
            &TransitionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FspecError::BlockedReasonRequired));
        // Document unmodified
        let unit = data.get("AUTH-001").unwrap();
        assert_eq!(unit.status, WorkUnitStatus::Backlog);
        assert_eq!(unit.state_history.len(), 1);

        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Blocked,
            &TransitionOptions {
                reason: Some("waiting on design".to_string()),
                skip_artifact_check: false,
            },
        )
        .unwrap();
        let unit = data.get("AUTH-001").unwrap();
        assert_eq!(unit.blocked_reason.as_deref(), Some("waiting on design"));
        assert_eq!(unit.state_history.len(), 2);
    }

    #[test]
    fn leaving_blocked_clears_reason() {
        let (_dir, ctx, mut data) = setup();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Blocked,
            &TransitionOptions {
                reason: Some("infra".to_string()),
                skip_artifact_check: false,
            },
        )
        .unwrap();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Backlog,
            &TransitionOptions::default(),
        )
        .unwrap();
        assert!(data.get("AUTH-001").unwrap().blocked_reason.is_none());
    }

    #[test]
    fn unanswered_questions_gate_testing() {
        let (_dir, ctx, mut data) = setup();
        {
            let unit = data.get_mut("AUTH-001").unwrap();
            collection::append(
                &mut unit.questions,
                Question::new("what about MFA?"),
                &mut unit.next_question_id,
            );
        }
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap();

        let err = transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &skip_artifacts(),
        )
        .unwrap_err();
        assert!(matches!(err, FspecError::UnansweredQuestions { .. }));

        // Answering unblocks
        data.get_mut("AUTH-001").unwrap().questions[0].answer = Some("phase 2".to_string());
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &skip_artifacts(),
        )
        .unwrap();
    }

    #[test]
    fn deleted_questions_do_not_gate() {
        let (_dir, ctx, mut data) = setup();
        {
            let unit = data.get_mut("AUTH-001").unwrap();
            let qid = collection::append(
                &mut unit.questions,
                Question::new("obsolete?"),
                &mut unit.next_question_id,
            );
            collection::soft_delete(&mut unit.questions, qid, "questions").unwrap();
        }
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &skip_artifacts(),
        )
        .unwrap();
    }

    #[test]
    fn missing_feature_file_blocks_testing() {
        let (_dir, ctx, mut data) = setup();
        let err = transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &TransitionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FspecError::MissingArtifact { .. }));
    }

    #[test]
    fn feature_file_written_after_specifying_passes() {
        let (dir, ctx, mut data) = setup();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap();

        // Write the artifact after entering specifying
        std::fs::create_dir_all(dir.path().join("spec/features")).unwrap();
        std::fs::write(
            dir.path().join("spec/features/login.feature"),
            "@AUTH-001\nFeature: Login\n",
        )
        .unwrap();
        data.get_mut("AUTH-001").unwrap().feature_file = Some("login".to_string());

        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &TransitionOptions::default(),
        )
        .unwrap();
    }

    #[test]
    fn stale_feature_file_blocks_testing() {
        let (dir, ctx, mut data) = setup();

        // Artifact written before entering specifying
        std::fs::create_dir_all(dir.path().join("spec/features")).unwrap();
        std::fs::write(
            dir.path().join("spec/features/login.feature"),
            "Feature: Login\n",
        )
        .unwrap();
        data.get_mut("AUTH-001").unwrap().feature_file = Some("login".to_string());

        // Force the specifying entry timestamp past the file mtime
        std::thread::sleep(std::time::Duration::from_millis(20));
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap();

        let err = transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &TransitionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FspecError::StaleArtifact { .. }));

        // Skip flag lets a reverse-ACDD import through
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &skip_artifacts(),
        )
        .unwrap();
    }

    #[test]
    fn blocker_gates_active_states_until_done() {
        let (_dir, ctx, mut data) = setup();
        data.insert(WorkUnit::new("AUTH-002", "Sessions", WorkUnitType::Story)).unwrap();
        crate::graph::add_relation(
            &mut data,
            "AUTH-001",
            crate::types::RelationKind::BlockedBy,
            "AUTH-002",
        )
        .unwrap();

        let err = transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FspecError::ActiveBlocker { .. }));

        // Blocker done → same transition succeeds
        data.get_mut("AUTH-002").unwrap().status = WorkUnitStatus::Done;
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Specifying,
            &TransitionOptions::default(),
        )
        .unwrap();
    }

    #[test]
    fn backward_transition_is_allowed() {
        let (_dir, ctx, mut data) = setup();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Implementing,
            &skip_artifacts(),
        )
        .unwrap();
        transition(
            &ctx,
            &mut data,
            "AUTH-001",
            WorkUnitStatus::Testing,
            &skip_artifacts(),
        )
        .unwrap();
        assert_eq!(data.get("AUTH-001").unwrap().status, WorkUnitStatus::Testing);
    }
}
