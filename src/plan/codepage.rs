//! Planning rules for one codepage table: source, header and the test
//! data header. Mapping rows are emitted in ascending byte order.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::model::{CodepageMapping, Project};
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "runtime_codepage.c";
const CATEGORY_HEADER: &str = "runtime_codepage.h";
const CATEGORY_TEST: &str = "runtime_codepage_test.h";

pub fn plans(project: &Project, index: usize) -> Vec<ArtifactPlan> {
    let codepage = &project.codepages[index];
    let lib = &project.library_name;
    let suffix = project.library_name_suffix();

    let mut source = ArtifactPlan::new(
        format!("{lib}/{lib}_codepage_{}.c", codepage.name),
        Subject::Codepage(index),
    );
    source.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "codepage",
        "start",
    )));
    for mapping in sorted(&codepage.mapping) {
        source.push(PlanEntry::with_overlay(
            FragmentKey::new(CATEGORY_SOURCE, "mapping-entry"),
            mapping_overlay(&mapping),
        ));
    }
    source.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "codepage",
        "end",
    )));

    let mut header = ArtifactPlan::new(
        format!("{lib}/{lib}_codepage_{}.h", codepage.name),
        Subject::Codepage(index),
    );
    header.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, "codepage")));

    let mut test_header = ArtifactPlan::new(
        format!("tests/{suffix}_test_codepage_{}.h", codepage.name),
        Subject::Codepage(index),
    );
    test_header.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_TEST,
        "header",
        "start",
    )));
    for mapping in sorted(&codepage.test_mappings) {
        test_header.push(PlanEntry::with_overlay(
            FragmentKey::new(CATEGORY_TEST, "test_mapping-entry"),
            mapping_overlay(&mapping),
        ));
    }
    test_header.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_TEST,
        "header",
        "end",
    )));

    vec![source, header, test_header]
}

fn sorted(mappings: &[CodepageMapping]) -> Vec<CodepageMapping> {
    let mut rows = mappings.to_vec();
    rows.sort_by_key(|mapping| mapping.byte);
    rows
}

fn mapping_overlay(mapping: &CodepageMapping) -> Vec<(String, String)> {
    vec![
        ("byte".to_string(), format!("0x{:02x}", mapping.byte)),
        (
            "codepoint".to_string(),
            format!("0x{:04x}", mapping.codepoint),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::sample_project;

    #[test]
    fn mapping_rows_are_sorted_by_byte() {
        let mut project = sample_project();
        let mut mapping: Vec<serde_json::Value> = (0u32..256)
            .map(|byte| serde_json::json!({ "byte": byte, "codepoint": byte }))
            .collect();
        mapping.reverse();
        project.codepages = serde_json::from_value(serde_json::json!([{
            "name": "windows_1252",
            "description": "Windows 1252",
            "mapping": mapping,
            "test_mappings": [
                { "byte": 128, "codepoint": 8364 },
                { "byte": 1, "codepoint": 1 },
            ],
        }]))
        .expect("codepage json");

        let plans = plans(&project, 0);
        let source = &plans[0];
        // start + 256 rows + end
        assert_eq!(source.entries.len(), 258);
        let first_row = &source.entries[1].overlay;
        assert!(first_row.contains(&("byte".to_string(), "0x00".to_string())));

        let test_header = &plans[2];
        let first_test = &test_header.entries[1].overlay;
        assert!(first_test.contains(&("byte".to_string(), "0x01".to_string())));
    }
}
