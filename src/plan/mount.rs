//! Planning rules for the mount tool: handle, file system and file entry
//! translation units plus the tool main with all four driver families.
//!
//! Every driver variant (FUSE legacy, FUSE 3, OSXFuse, Dokan) is always
//! generated; preprocessor guards inside the fragments select one at
//! compile time. Credentials from the profile contribute an option global,
//! a getopt case arm, a `mount_handle_set_*` function and the handle
//! members that back it.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::model::Project;
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "yalmount.c";
const CATEGORY_HEADER: &str = "yalmount.h";

const DRIVERS: [&str; 4] = ["fuse", "fuse3", "osxfuse", "dokan"];

pub fn plans(project: &Project) -> Vec<ArtifactPlan> {
    let Some(mount_tool) = project.mount_tool.as_ref() else {
        return Vec::new();
    };
    let suffix = project.library_name_suffix();
    let credentials = &mount_tool.credentials;
    let mut artifacts = Vec::new();

    let mut handle_source = ArtifactPlan::new(
        format!("{suffix}tools/mount_handle.c"),
        Subject::MountTool,
    );
    handle_source.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "mount_handle",
        "start",
    )));
    for credential in credentials {
        handle_source.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_SOURCE,
            "mount_handle",
            &format!("set_{}", credential.as_str()),
        )));
    }
    // Segment-file sources resolve the filename through the library glob
    // before opening; everything else opens the one file directly.
    let open_variant = if mount_tool.has_glob { "open-glob" } else { "open" };
    handle_source.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "mount_handle",
        open_variant,
    )));
    handle_source.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "mount_handle",
        "end",
    )));
    artifacts.push(handle_source);

    let mut handle_header = ArtifactPlan::new(
        format!("{suffix}tools/mount_handle.h"),
        Subject::MountTool,
    );
    handle_header.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "mount_handle",
        "start",
    )));
    for credential in credentials {
        handle_header.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_HEADER,
            "mount_handle",
            &format!("member-{}", credential.as_str()),
        )));
    }
    handle_header.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "mount_handle",
        "middle",
    )));
    for credential in credentials {
        handle_header.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_HEADER,
            "mount_handle",
            &format!("set_{}", credential.as_str()),
        )));
    }
    handle_header.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_HEADER,
        "mount_handle",
        "end",
    )));
    artifacts.push(handle_header);

    for role in ["mount_file_system", "mount_file_entry"] {
        let mut source = ArtifactPlan::new(
            format!("{suffix}tools/{role}.c"),
            Subject::MountTool,
        );
        source.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, role)));
        artifacts.push(source);

        let mut header = ArtifactPlan::new(
            format!("{suffix}tools/{role}.h"),
            Subject::MountTool,
        );
        header.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, role)));
        artifacts.push(header);
    }

    let mut main = ArtifactPlan::new(
        format!("{suffix}tools/{suffix}mount.c"),
        Subject::MountTool,
    );
    // Both the usage text (start) and the getopt loop (entry) splice
    // in the credential option letters.
    let option_string: String = credentials
        .iter()
        .map(|credential| format!("{}:", credential.letter()))
        .collect();
    let option_flags: String = credentials
        .iter()
        .map(|credential| credential.letter())
        .collect();
    let option_overlay = vec![
        ("mount_tool_option_string".to_string(), option_string),
        ("mount_tool_option_flags".to_string(), option_flags),
    ];
    main.push(PlanEntry::with_overlay(
        FragmentKey::with_variant(CATEGORY_SOURCE, "main", "start"),
        option_overlay.clone(),
    ));
    for credential in credentials {
        main.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_SOURCE,
            "main",
            &format!("option-{}", credential.as_str()),
        )));
    }
    for driver in DRIVERS {
        main.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_SOURCE,
            "main",
            driver,
        )));
    }
    main.push(PlanEntry::with_overlay(
        FragmentKey::with_variant(CATEGORY_SOURCE, "main", "entry"),
        option_overlay,
    ));
    for credential in credentials {
        main.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_SOURCE,
            "main",
            &format!("case-{}", credential.as_str()),
        )));
    }
    main.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "main",
        "middle",
    )));
    for credential in credentials {
        main.push(PlanEntry::new(FragmentKey::with_variant(
            CATEGORY_SOURCE,
            "main",
            &format!("set-{}", credential.as_str()),
        )));
    }
    main.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "main",
        "end",
    )));
    artifacts.push(main);

    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::sample_project;

    #[test]
    fn credentials_contribute_option_string_and_case_arms() {
        let mut project = sample_project();
        project.mount_tool = serde_json::from_value(serde_json::json!({
            "source_type": "volume",
            "file_entry_type": "file_entry",
            "credentials": [ "password", "recovery_password" ],
        }))
        .expect("mount tool json");
        let plans = plans(&project);
        let main = plans
            .iter()
            .find(|p| p.path.ends_with("samplemount.c"))
            .expect("mount main");

        let entry = main
            .entries
            .iter()
            .find(|e| e.key.stem() == "main-entry")
            .expect("getopt loop entry");
        assert!(entry.overlay.contains(&(
            "mount_tool_option_string".to_string(),
            "p:r:".to_string()
        )));

        let stems: Vec<String> = main.entries.iter().map(|e| e.key.stem()).collect();
        assert!(stems.contains(&"main-case-password".to_string()));
        assert!(stems.contains(&"main-set-recovery_password".to_string()));

        let handle = plans
            .iter()
            .find(|p| p.path.ends_with("mount_handle.c"))
            .expect("mount handle");
        let handle_stems: Vec<String> = handle.entries.iter().map(|e| e.key.stem()).collect();
        assert!(handle_stems.contains(&"mount_handle-set_password".to_string()));
        assert!(handle_stems.contains(&"mount_handle-open".to_string()));
    }

    #[test]
    fn glob_profile_selects_the_glob_open() {
        let mut project = sample_project();
        project.mount_tool = serde_json::from_value(serde_json::json!({
            "source_type": "handle",
            "file_entry_type": "file_entry",
            "has_glob": true,
        }))
        .expect("mount tool json");
        let plans = plans(&project);
        let handle = plans
            .iter()
            .find(|p| p.path.ends_with("mount_handle.c"))
            .expect("mount handle");
        let stems: Vec<String> = handle.entries.iter().map(|e| e.key.stem()).collect();
        assert!(stems.contains(&"mount_handle-open-glob".to_string()));
        assert!(!stems.contains(&"mount_handle-open".to_string()));
    }
}
