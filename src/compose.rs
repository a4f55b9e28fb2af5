//! The composer: turn one artifact plan into the full text of the file.
//!
//! The planner decides which fragments make up an artifact; the composer
//! builds the binding context, expands every fragment and joins the
//! results. It never introduces whitespace inside a fragment; fragments
//! are joined with a single newline and the artifact always ends in one.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::expand::{BindingContext, expand};
use crate::model::{MountSourceType, Project};
use crate::store::{FragmentKey, TemplateStore};

/// Which schema record an artifact is generated from. Project-wide
/// artifacts (library support files) carry `Project`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Project,
    Structure(usize),
    Type(usize),
    Codepage(usize),
    MountTool,
    InfoTool,
}

/// One (fragment, context overlay) step of a plan.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub key: FragmentKey,
    pub overlay: Vec<(String, String)>,
}

impl PlanEntry {
    pub fn new(key: FragmentKey) -> Self {
        PlanEntry {
            key,
            overlay: Vec::new(),
        }
    }

    pub fn with_overlay(key: FragmentKey, overlay: Vec<(String, String)>) -> Self {
        PlanEntry { key, overlay }
    }
}

/// Ordered fragment list for a single output file.
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    /// Output path relative to the output tree root.
    pub path: PathBuf,
    pub subject: Subject,
    pub entries: Vec<PlanEntry>,
    /// Scripts get the executable bit on emit.
    pub executable: bool,
}

impl ArtifactPlan {
    pub fn new(path: impl Into<PathBuf>, subject: Subject) -> Self {
        ArtifactPlan {
            path: path.into(),
            subject,
            entries: Vec::new(),
            executable: false,
        }
    }

    pub fn push(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }
}

/// Project-wide placeholder bindings, shared by every artifact.
fn project_context(project: &Project) -> BindingContext {
    let mut ctx = BindingContext::new();
    ctx.set("project_name", &project.project_name);
    ctx.set("project_long_name", &project.project_long_name);
    ctx.set("library_name", &project.library_name);
    ctx.set("library_name_suffix", project.library_name_suffix());
    ctx.set("python_module_name", &project.python_module_name);
    ctx.set("tools_name", &project.tools_name);
    ctx.set("authors", &project.authors);
    ctx.set("copyright", &project.copyright);
    ctx
}

/// Base context for the artifact's subject. Per-member and per-value
/// bindings come in through plan-entry overlays instead.
pub fn base_context(project: &Project, subject: Subject) -> Result<BindingContext> {
    let mut ctx = project_context(project);
    match subject {
        Subject::Project => {}
        Subject::Structure(index) => {
            let structure = project.structures.get(index).ok_or_else(|| {
                Error::Internal(format!("structure index {index} out of range"))
            })?;
            ctx.set("structure_name", &structure.name);
            ctx.set("structure_description", &structure.description);
            ctx.set(
                "prefix",
                structure.prefix.as_deref().unwrap_or(&project.library_name),
            );
            ctx.set("structure_size", structure.wire_size().to_string());
        }
        Subject::Type(index) => {
            let handle_type = project
                .types
                .get(index)
                .ok_or_else(|| Error::Internal(format!("type index {index} out of range")))?;
            ctx.set("type_name", &handle_type.name);
            ctx.set("type_description", &handle_type.description);
            ctx.set(
                "base_type",
                handle_type.base_type.as_deref().unwrap_or(&handle_type.name),
            );
        }
        Subject::Codepage(index) => {
            let codepage = project.codepages.get(index).ok_or_else(|| {
                Error::Internal(format!("codepage index {index} out of range"))
            })?;
            ctx.set("codepage_name", &codepage.name);
            ctx.set("codepage_description", &codepage.description);
            ctx.set(
                "number_of_test_mappings",
                codepage.test_mappings.len().to_string(),
            );
        }
        Subject::MountTool => {
            let mount_tool = project
                .mount_tool
                .as_ref()
                .ok_or_else(|| Error::Internal("no mount tool profile".to_string()))?;
            ctx.set("mount_source_type", mount_tool.source_type.as_str());
            ctx.set("file_entry_type", &mount_tool.file_entry_type);
            ctx.set(
                "file_system_type",
                mount_tool
                    .file_system_type
                    .as_deref()
                    .unwrap_or(&mount_tool.file_entry_type),
            );
            ctx.set("path_prefix", &mount_tool.path_prefix);
            ctx.set(
                "access_time_member",
                mount_tool.access_time_member.as_deref().unwrap_or("access_time"),
            );
            ctx.set(
                "creation_time_member",
                mount_tool
                    .creation_time_member
                    .as_deref()
                    .unwrap_or("creation_time"),
            );
            ctx.set(
                "modification_time_member",
                mount_tool
                    .modification_time_member
                    .as_deref()
                    .unwrap_or("modification_time"),
            );
            ctx.set(
                "inode_change_time_member",
                mount_tool
                    .inode_change_time_member
                    .as_deref()
                    .unwrap_or("inode_change_time"),
            );
            // Volume and container sources mount one entry under the
            // synthesized prefix; file sources mount the root directly.
            let source_description = match mount_tool.source_type {
                MountSourceType::File => "file",
                MountSourceType::Volume => "volume",
                MountSourceType::Handle => "handle",
                MountSourceType::Container => "container",
            };
            ctx.set("mount_source_description", source_description);
        }
        Subject::InfoTool => {
            let info_tool = project
                .info_tool
                .as_ref()
                .ok_or_else(|| Error::Internal("no info tool profile".to_string()))?;
            ctx.set("info_source_type", &info_tool.source_type);
        }
    }
    Ok(ctx)
}

/// Expand every entry of `plan` and join the pieces.
pub fn compose(project: &Project, store: &TemplateStore, plan: &ArtifactPlan) -> Result<String> {
    let base = base_context(project, plan.subject)?;
    let mut pieces = Vec::with_capacity(plan.entries.len());

    for entry in &plan.entries {
        // A `-start` fragment without its `-end` twin is a corpus defect;
        // catch it before expanding anything.
        store.check_split(&entry.key)?;
        let fragment = store.get(&entry.key)?;
        let mut ctx = base.clone();
        ctx.merge(&entry.overlay);
        let expanded = expand(&fragment.text, &ctx).map_err(|detail| Error::Expand {
            fragment: entry.key.to_string(),
            detail,
        })?;
        pieces.push(expanded.trim_end_matches('\n').to_string());
    }

    let mut text = pieces.join("\n");
    text.push('\n');
    Ok(text)
}
