//! Planning rules for the library support files shared by every project:
//! error, notify, i18n, bit stream, Huffman tree, string helpers and the
//! public feature/type headers.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::model::Project;
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "libyal.c";
const CATEGORY_HEADER: &str = "libyal.h";

/// Support roles with both a source and a header.
const PAIRED_ROLES: [&str; 6] = [
    "error",
    "notify",
    "i18n",
    "bit_stream",
    "huffman_tree",
    "system_string",
];

/// Header-only support roles inside the library directory.
const HEADER_ROLES: [&str; 2] = ["extern", "unused"];

/// Public headers under `include/<library_name>/`.
const PUBLIC_ROLES: [&str; 2] = ["features", "types"];

pub fn plans(project: &Project) -> Vec<ArtifactPlan> {
    let lib = &project.library_name;
    let mut artifacts = Vec::new();

    for role in PAIRED_ROLES {
        let mut source = ArtifactPlan::new(
            format!("{lib}/{lib}_{role}.c"),
            Subject::Project,
        );
        source.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, role)));
        artifacts.push(source);

        let mut header = ArtifactPlan::new(
            format!("{lib}/{lib}_{role}.h"),
            Subject::Project,
        );
        header.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, role)));
        artifacts.push(header);
    }

    let mut header_roles: Vec<&str> = HEADER_ROLES.to_vec();
    if project.features.has_wide_character_type {
        header_roles.push("wide_string");
    }
    for role in header_roles {
        let mut header = ArtifactPlan::new(
            format!("{lib}/{lib}_{role}.h"),
            Subject::Project,
        );
        header.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, role)));
        artifacts.push(header);
    }

    for role in PUBLIC_ROLES {
        let mut header = ArtifactPlan::new(
            format!("include/{lib}/{role}.h"),
            Subject::Project,
        );
        header.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, role)));
        artifacts.push(header);
    }

    artifacts
}
