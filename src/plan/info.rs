//! Planning rules for the informational CLI: the info handle translation
//! unit and the tool main. Option letters come straight from the schema;
//! there is no closed set.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::model::Project;
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "yalinfo.c";
const CATEGORY_HEADER: &str = "yalinfo.h";

pub fn plans(project: &Project) -> Vec<ArtifactPlan> {
    let suffix = project.library_name_suffix();
    let mut artifacts = Vec::new();

    let mut handle_source = ArtifactPlan::new(
        format!("{suffix}tools/info_handle.c"),
        Subject::InfoTool,
    );
    handle_source.push(PlanEntry::new(FragmentKey::new(
        CATEGORY_SOURCE,
        "info_handle",
    )));
    artifacts.push(handle_source);

    let mut handle_header = ArtifactPlan::new(
        format!("{suffix}tools/info_handle.h"),
        Subject::InfoTool,
    );
    handle_header.push(PlanEntry::new(FragmentKey::new(
        CATEGORY_HEADER,
        "info_handle",
    )));
    artifacts.push(handle_header);

    let mut main = ArtifactPlan::new(
        format!("{suffix}tools/{suffix}info.c"),
        Subject::InfoTool,
    );
    let option_string: String = project
        .info_tool
        .as_ref()
        .map(|info_tool| {
            info_tool
                .options
                .iter()
                .map(|option| format!("{}:", option.letter))
                .collect()
        })
        .unwrap_or_default();
    // Both the usage text (start) and the getopt loop (end) splice in the
    // accumulated option string.
    let option_overlay = vec![("info_tool_option_string".to_string(), option_string)];
    main.push(PlanEntry::with_overlay(
        FragmentKey::with_variant(CATEGORY_SOURCE, "main", "start"),
        option_overlay.clone(),
    ));
    if let Some(info_tool) = &project.info_tool {
        for option in &info_tool.options {
            main.push(PlanEntry::with_overlay(
                FragmentKey::with_variant(CATEGORY_SOURCE, "main", "option"),
                vec![
                    ("option_letter".to_string(), option.letter.to_string()),
                    ("option_name".to_string(), option.name.clone()),
                    ("option_help".to_string(), option.help.clone()),
                ],
            ));
        }
    }
    main.push(PlanEntry::with_overlay(
        FragmentKey::with_variant(CATEGORY_SOURCE, "main", "end"),
        option_overlay,
    ));
    artifacts.push(main);

    artifacts
}
