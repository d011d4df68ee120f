use serde::Serialize;
use tint_contracts::plan::{Edit, EditPlan};

use crate::appearance::lock;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies every edit whose surface exists. Unknown surfaces and appearances
/// without a color are counted as skipped.
pub fn apply_plan(plan: &EditPlan, registry: &Registry) -> ApplyReport {
    let mut report = ApplyReport::default();
    for edit in &plan.edits {
        if apply_edit(registry, edit) {
            report.applied += 1;
        } else {
            report.skipped += 1;
        }
    }
    report
}

pub fn apply_edit(registry: &Registry, edit: &Edit) -> bool {
    let Some(handle) = registry.get(&edit.surface_name) else {
        return false;
    };
    let mut appearance = lock(handle);
    let capabilities = appearance.capabilities();
    if !capabilities.color || !appearance.set_color(edit.color) {
        return false;
    }
    // Color writes can reset blend state on translucent surfaces.
    if capabilities.transparency
        && appearance
            .transparency()
            .is_some_and(|transparency| transparency.is_translucent())
    {
        appearance.set_transparent(true);
    }
    appearance.set_needs_update(true);
    true
}
