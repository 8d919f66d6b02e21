pub mod dependency;
pub mod epic;
pub mod event_storm;
pub mod feature;
pub mod foundation;
pub mod init;
pub mod item;
pub mod prefix;
pub mod query;
pub mod repair;
pub mod tag;
pub mod work_unit;

use fspec_core::workunit::{WorkUnit, WorkUnitsData};
use fspec_core::ProjectContext;
use std::path::Path;

/// Load work-units.json, apply a mutation to one unit, and save.
pub(crate) fn mutate_unit<T>(
    root: &Path,
    id: &str,
    f: impl FnOnce(&mut WorkUnit) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let ctx = ProjectContext::new(root);
    let mut data = WorkUnitsData::load(&ctx)?;
    let out = f(data.get_mut(id)?)?;
    data.save(&ctx)?;
    Ok(out)
}

/// Load work-units.json and read one unit.
pub(crate) fn read_unit<T>(
    root: &Path,
    id: &str,
    f: impl FnOnce(&WorkUnit) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let ctx = ProjectContext::new(root);
    let data = WorkUnitsData::load(&ctx)?;
    f(data.get(id)?)
}
