use crate::collection::SoftDeletable;
use crate::error::Result;
use crate::workunit::WorkUnitsData;

/// Run any pending schema migrations on a loaded [`WorkUnitsData`].
///
/// Documents written before the per-collection counters existed carry no
/// `nextXId` fields; serde defaults them to 0, which would reuse stable
/// IDs. The backfill runs once here at load time instead of at every call
/// site: each counter is raised to one past the highest ID present.
pub fn migrate_work_units(mut data: WorkUnitsData) -> Result<WorkUnitsData> {
    // Schema v1: counter backfill only. When the schema changes in ways
    // that require data transforms, dispatch on data.meta.version here.
    for unit in data.work_units.values_mut() {
        backfill(&mut unit.next_rule_id, &unit.rules);
        backfill(&mut unit.next_example_id, &unit.examples);
        backfill(&mut unit.next_question_id, &unit.questions);
        backfill(&mut unit.next_assumption_id, &unit.assumptions);
        backfill(&mut unit.next_note_id, &unit.architecture_notes);
        if let Some(storm) = unit.event_storm.as_mut() {
            backfill(&mut storm.next_item_id, &storm.items);
        }
    }
    Ok(data)
}

fn backfill<T: SoftDeletable>(next_id: &mut u32, items: &[T]) {
    let max = items.iter().map(|i| i.item_id()).max();
    if let Some(max) = max {
        if *next_id <= max {
            *next_id = max + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Rule;
    use crate::types::WorkUnitType;
    use crate::workunit::WorkUnit;

    #[test]
    fn backfills_missing_counters() {
        let mut data = WorkUnitsData::new();
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        // Simulate an older document: items present, counter absent (0)
        let mut rule = Rule::new("a");
        rule.id = 0;
        unit.rules.push(rule);
        let mut rule = Rule::new("b");
        rule.id = 1;
        unit.rules.push(rule);
        unit.next_rule_id = 0;
        data.insert(unit).unwrap();

        let migrated = migrate_work_units(data).unwrap();
        assert_eq!(migrated.get("AUTH-001").unwrap().next_rule_id, 2);
    }

    #[test]
    fn leaves_correct_counters_alone() {
        let mut data = WorkUnitsData::new();
        let mut unit = WorkUnit::new("AUTH-001", "Login", WorkUnitType::Story);
        unit.next_rule_id = 7;
        data.insert(unit).unwrap();

        let migrated = migrate_work_units(data).unwrap();
        assert_eq!(migrated.get("AUTH-001").unwrap().next_rule_id, 7);
    }
}
