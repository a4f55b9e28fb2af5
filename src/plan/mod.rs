//! The planner: enumerate every artifact a project requires.
//!
//! Plans are built by static rules keyed on the subject kind; nothing here
//! looks at fragment text. Each rule module returns `ArtifactPlan` values
//! that the composer consumes one by one.

pub mod codepage;
pub mod info;
pub mod library;
pub mod mount;
pub mod structure;
pub mod types;

use log::info as log_info;

use crate::compose::ArtifactPlan;
use crate::error::Result;
use crate::model::Project;

/// All artifacts for `project`, in a stable order: library support files
/// first, then structures, types, codepages and the tool subsystems.
pub fn plan_project(project: &Project) -> Result<Vec<ArtifactPlan>> {
    let mut plans = Vec::new();

    plans.extend(library::plans(project));
    for index in 0..project.structures.len() {
        plans.extend(structure::plans(project, index));
    }
    for index in 0..project.types.len() {
        plans.extend(types::plans(project, index)?);
    }
    for index in 0..project.codepages.len() {
        plans.extend(codepage::plans(project, index));
    }
    if project.mount_tool.is_some() {
        plans.extend(mount::plans(project));
    }
    if project.info_tool.is_some() {
        plans.extend(info::plans(project));
    }

    log_info!("planned {} artifacts", plans.len());
    Ok(plans)
}
