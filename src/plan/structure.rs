//! Planning rules for one declared binary structure: a runtime source, a
//! header and a test source, assembled member by member in declared order.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::model::{MemberKind, Project, SignatureValue, Structure, StructureMember};
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "runtime_structure.c";
const CATEGORY_HEADER: &str = "runtime_structure.h";
const CATEGORY_TEST: &str = "runtime_structure_test.c";

pub fn plans(project: &Project, index: usize) -> Vec<ArtifactPlan> {
    let structure = &project.structures[index];
    vec![
        source_plan(project, structure, index),
        header_plan(project, structure, index),
        test_plan(project, structure, index),
    ]
}

/// `<lib>/<lib>_<structure>.c`
fn source_plan(project: &Project, structure: &Structure, index: usize) -> ArtifactPlan {
    let mut plan = ArtifactPlan::new(
        format!(
            "{lib}/{lib}_{name}.c",
            lib = project.library_name,
            name = structure.name
        ),
        Subject::Structure(index),
    );

    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, "initialize")));
    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, "free")));
    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "read_data",
        "start",
    )));

    for member in &structure.members {
        let overlay = member_overlay(member);
        plan.push(PlanEntry::with_overlay(
            FragmentKey::with_variant(CATEGORY_SOURCE, "read_data", read_variant(member.kind)),
            overlay.clone(),
        ));
        // Debug blocks follow the main block of the same member and are
        // only planned when the feature flag is on; the fragment body
        // carries its own HAVE_DEBUG_OUTPUT guard.
        if project.features.has_debug_output {
            if let Some(variant) = debug_variant(member.kind, project) {
                plan.push(PlanEntry::with_overlay(
                    FragmentKey::with_variant(CATEGORY_SOURCE, "debug", variant),
                    overlay,
                ));
            }
        }
    }

    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "read_data",
        "end",
    )));
    // Reading through a file IO handle needs libbfio in the library.
    if project.features.has_bfio {
        plan.push(PlanEntry::new(FragmentKey::new(
            CATEGORY_SOURCE,
            "read_file_io_handle",
        )));
    }
    plan
}

/// `<lib>/<lib>_<structure>.h`
fn header_plan(project: &Project, structure: &Structure, index: usize) -> ArtifactPlan {
    let mut plan = ArtifactPlan::new(
        format!(
            "{lib}/{lib}_{name}.h",
            lib = project.library_name,
            name = structure.name
        ),
        Subject::Structure(index),
    );

    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "structure",
        "start",
    )));
    for member in &structure.members {
        let variant = match member.kind {
            MemberKind::Bytes
            | MemberKind::SignatureStream
            | MemberKind::Guid
            | MemberKind::String => "member-array",
            _ => "member-integer",
        };
        plan.push(PlanEntry::with_overlay(
            FragmentKey::with_variant(CATEGORY_HEADER, "structure", variant),
            member_overlay(member),
        ));
    }
    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "structure",
        "middle",
    )));
    if project.features.has_bfio {
        plan.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_HEADER,
            "structure",
            "read_file_io_handle",
        )));
    }
    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "structure",
        "end",
    )));
    plan
}

/// `tests/<suffix>_test_<structure>.c`
fn test_plan(project: &Project, structure: &Structure, index: usize) -> ArtifactPlan {
    let mut plan = ArtifactPlan::new(
        format!(
            "tests/{suffix}_test_{name}.c",
            suffix = project.library_name_suffix(),
            name = structure.name
        ),
        Subject::Structure(index),
    );
    // The test data array carries the declared signature literals at
    // their wire offsets, so the regular-case read succeeds.
    plan.push(PlanEntry::with_overlay(
        FragmentKey::new(CATEGORY_TEST, "start"),
        vec![("structure_test_data".to_string(), test_data(structure))],
    ));
    for role in ["initialize", "free", "read_data", "end"] {
        plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_TEST, role)));
    }
    plan
}

/// C initializer rows for the structure's test data: signature members
/// contribute their literal bytes, everything else reads as zeros.
fn test_data(structure: &Structure) -> String {
    let mut bytes: Vec<u8> = Vec::with_capacity(structure.wire_size() as usize);
    for member in &structure.members {
        let width = member.width() as usize;
        let offset = bytes.len();
        match &member.value {
            Some(SignatureValue::Stream(literal)) => {
                bytes.extend_from_slice(literal.as_bytes());
            }
            Some(SignatureValue::Integer(value)) => {
                bytes.extend_from_slice(&value.to_le_bytes()[..width.min(8)]);
            }
            None => {}
        }
        bytes.resize(offset + width, 0);
    }
    bytes
        .chunks(8)
        .map(|chunk| {
            let row: Vec<String> = chunk.iter().map(|byte| format!("0x{byte:02x}")).collect();
            format!("\t{}", row.join(", "))
        })
        .collect::<Vec<String>>()
        .join(",\n")
}

/// `read_data` fragment variant for a member interpretation.
fn read_variant(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Bytes => "bytes",
        MemberKind::LeUint16 | MemberKind::LeUint32 | MemberKind::LeUint64 => "integer",
        MemberKind::Guid => "guid",
        MemberKind::Filetime => "filetime",
        MemberKind::FatDatetime => "fat_datetime",
        MemberKind::PosixTime32 | MemberKind::PosixTime64 => "posix_time",
        MemberKind::SignatureStream => "check_signature-stream",
        MemberKind::SignatureInteger => "check_signature-integer",
        MemberKind::String => "string",
    }
}

/// Debug-print fragment for members that have one.
fn debug_variant(kind: MemberKind, project: &Project) -> Option<&'static str> {
    match kind {
        MemberKind::Filetime => Some("filetime"),
        MemberKind::Guid => Some("guid"),
        MemberKind::String => {
            if project.features.has_wide_character_type {
                Some("string_16bit")
            } else {
                Some("string_8bit")
            }
        }
        _ => None,
    }
}

fn bit_size(member: &StructureMember) -> Option<u32> {
    match member.kind {
        MemberKind::LeUint16 => Some(16),
        MemberKind::LeUint32 => Some(32),
        MemberKind::LeUint64 => Some(64),
        MemberKind::Filetime => Some(64),
        MemberKind::FatDatetime => Some(32),
        MemberKind::PosixTime32 => Some(32),
        MemberKind::PosixTime64 => Some(64),
        MemberKind::SignatureInteger => Some(member.width() * 8),
        _ => None,
    }
}

fn member_overlay(member: &StructureMember) -> Vec<(String, String)> {
    let mut overlay = vec![
        ("member_name".to_string(), member.name.clone()),
        ("member_description".to_string(), member.description.clone()),
        ("member_width".to_string(), member.width().to_string()),
        (
            "debug_tabs".to_string(),
            "\t".repeat(usize::from(member.debug_tab.unwrap_or(1))),
        ),
    ];
    if let Some(bits) = bit_size(member) {
        overlay.push(("bit_size".to_string(), bits.to_string()));
    }
    match &member.value {
        Some(SignatureValue::Stream(literal)) => {
            overlay.push(("signature_value".to_string(), literal.clone()));
        }
        Some(SignatureValue::Integer(value)) => {
            overlay.push(("signature_value".to_string(), format!("0x{value:x}")));
        }
        None => {}
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::sample_project;

    #[test]
    fn test_data_carries_signature_literals() {
        let project = sample_project();
        let data = test_data(&project.structures[0]);
        // "WD" at offset 0, zeros for the size and identifier members.
        assert!(data.starts_with("\t0x57, 0x44, 0x00"));
        assert_eq!(data.matches("0x").count(), 22);
        assert!(!data.ends_with(','));

        let test_source = &plans(&project, 0)[2];
        let start = test_source.entries.first().expect("test start entry");
        assert_eq!(start.key.stem(), "start");
        assert!(
            start
                .overlay
                .iter()
                .any(|(name, _)| name == "structure_test_data")
        );
    }

    #[test]
    fn read_file_io_handle_follows_the_bfio_feature() {
        let mut project = sample_project();

        let stems: Vec<String> = plans(&project, 0)[0]
            .entries
            .iter()
            .map(|e| e.key.stem())
            .collect();
        assert!(!stems.contains(&"read_file_io_handle".to_string()));

        project.features.has_bfio = true;
        let source = &plans(&project, 0)[0];
        let stems: Vec<String> = source.entries.iter().map(|e| e.key.stem()).collect();
        assert!(stems.contains(&"read_file_io_handle".to_string()));

        let header = &plans(&project, 0)[1];
        let stems: Vec<String> = header.entries.iter().map(|e| e.key.stem()).collect();
        assert!(stems.contains(&"structure-read_file_io_handle".to_string()));
        assert!(stems.contains(&"structure-middle".to_string()));
    }
}
