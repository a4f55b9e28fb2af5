//! Planning rules for one public handle type: the Python wrapper source
//! and header, plus the runtime test source exercising every accessor.

use crate::compose::{ArtifactPlan, PlanEntry, Subject};
use crate::error::{Error, Result};
use crate::model::{HandleType, InitShape, ObjectLookup, Project, TypeValue, ValueKind};
use crate::store::FragmentKey;

const CATEGORY_SOURCE: &str = "pyyal_type.c";
const CATEGORY_HEADER: &str = "pyyal_type.h";
const CATEGORY_TEST: &str = "runtime_type_test.c";

pub fn plans(project: &Project, index: usize) -> Result<Vec<ArtifactPlan>> {
    let handle_type = &project.types[index];
    Ok(vec![
        source_plan(project, handle_type, index)?,
        header_plan(project, handle_type, index),
        test_plan(project, handle_type, index)?,
    ])
}

/// `py<suffix>/<python_module_name>_<type>.c`
fn source_plan(
    project: &Project,
    handle_type: &HandleType,
    index: usize,
) -> Result<ArtifactPlan> {
    let mut plan = ArtifactPlan::new(
        format!(
            "py{suffix}/{module}_{name}.c",
            suffix = project.library_name_suffix(),
            module = project.python_module_name,
            name = handle_type.name
        ),
        Subject::Type(index),
    );

    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "type",
        "start",
    )));
    let init_variant = match handle_type.init_shape {
        InitShape::Plain => "plain",
        InitShape::WithParent => "with_parent",
        InitShape::WithInput => "with_input",
    };
    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "init",
        init_variant,
    )));
    if handle_type.has_open {
        plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, "open")));
        plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, "close")));
    }

    for value in &handle_type.values {
        let overlay = value_overlay(value);
        plan.push(PlanEntry::with_overlay(accessor_key(value), overlay.clone()));
        if value.is_settable {
            let role = mutator_role(value).ok_or_else(|| Error::Plan {
                subject: format!("type {}: value {}", handle_type.name, value.name),
                message: "no mutator rule for object values".to_string(),
            })?;
            plan.push(PlanEntry::with_overlay(
                FragmentKey::new(CATEGORY_SOURCE, &role),
                overlay,
            ));
        }
    }

    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_SOURCE, "free")));
    plan.push(PlanEntry::new(FragmentKey::with_variant(
        CATEGORY_SOURCE,
        "type",
        "end",
    )));
    Ok(plan)
}

/// `py<suffix>/<python_module_name>_<type>.h`
fn header_plan(project: &Project, handle_type: &HandleType, index: usize) -> ArtifactPlan {
    let mut plan = ArtifactPlan::new(
        format!(
            "py{suffix}/{module}_{name}.h",
            suffix = project.library_name_suffix(),
            module = project.python_module_name,
            name = handle_type.name
        ),
        Subject::Type(index),
    );
    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_HEADER, "type")));
    plan
}

/// `tests/<suffix>_test_<type>.c` — per accessor, a regular-case and
/// error-case block wrapped in the function start/end pair.
fn test_plan(project: &Project, handle_type: &HandleType, index: usize) -> Result<ArtifactPlan> {
    let mut plan = ArtifactPlan::new(
        format!(
            "tests/{suffix}_test_{name}.c",
            suffix = project.library_name_suffix(),
            name = handle_type.name
        ),
        Subject::Type(index),
    );

    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_TEST, "start")));
    for value in &handle_type.values {
        let mut overlay = value_overlay(value);
        overlay.push((
            "function_name".to_string(),
            format!("get_{}", value.name),
        ));
        plan.push(PlanEntry::with_overlay(
            FragmentKey::new(CATEGORY_TEST, "function-start"),
            overlay.clone(),
        ));
        plan.push(PlanEntry::with_overlay(
            FragmentKey::with_variant(CATEGORY_TEST, "function-body", accessor_role(value)),
            overlay.clone(),
        ));
        plan.push(PlanEntry::with_overlay(
            FragmentKey::new(CATEGORY_TEST, "function-end"),
            overlay,
        ));
    }
    plan.push(PlanEntry::new(FragmentKey::new(CATEGORY_TEST, "end")));
    Ok(plan)
}

/// Accessor fragment role for a value kind.
fn accessor_role(value: &TypeValue) -> &'static str {
    match value.kind {
        ValueKind::Uint8 => "get_uint8_value",
        ValueKind::Uint16 => "get_uint16_value",
        ValueKind::Uint32 => "get_uint32_value",
        ValueKind::Uint64 => "get_uint64_value",
        ValueKind::Int64 => "get_int64_value",
        ValueKind::Boolean => "get_data_as_boolean",
        ValueKind::Filetime => "get_filetime_value",
        ValueKind::FatDatetime => "get_data_as_datetime",
        ValueKind::PosixTime => "get_posix_time_value",
        ValueKind::Guid => "get_guid_value",
        ValueKind::Binary => "get_binary_data_value",
        ValueKind::String => "get_string_value",
        ValueKind::Object => match value.lookup {
            None => "get_object_value",
            Some(ObjectLookup::ByName) => "get_sub_object_value_by_name",
            Some(ObjectLookup::ByPath) => "get_sub_object_value_by_path",
        },
    }
}

/// Values declared with absence semantics pick the `-is_set` accessor
/// variant, which maps result 0 to `Py_None`. Object lookups report
/// absence inherently and have no strict variant.
fn accessor_key(value: &TypeValue) -> FragmentKey {
    let role = accessor_role(value);
    if value.kind != ValueKind::Object && (value.is_set || value.has_value) {
        FragmentKey::with_variant(CATEGORY_SOURCE, role, "is_set")
    } else {
        FragmentKey::new(CATEGORY_SOURCE, role)
    }
}

/// The `set_*` family mirrors the accessor roles; object references have
/// no mutator.
fn mutator_role(value: &TypeValue) -> Option<String> {
    if value.kind == ValueKind::Object {
        return None;
    }
    Some(format!("set_{}", &accessor_role(value)[4..]))
}

fn value_c_type(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Uint8 | ValueKind::Boolean => "uint8_t",
        ValueKind::Uint16 => "uint16_t",
        ValueKind::Uint32 | ValueKind::FatDatetime => "uint32_t",
        ValueKind::Uint64 | ValueKind::Filetime => "uint64_t",
        ValueKind::Int64 | ValueKind::PosixTime => "int64_t",
        ValueKind::Guid | ValueKind::Binary | ValueKind::String => "uint8_t *",
        ValueKind::Object => "intptr_t *",
    }
}

fn value_overlay(value: &TypeValue) -> Vec<(String, String)> {
    vec![
        ("value_name".to_string(), value.name.clone()),
        ("value_description".to_string(), value.description.clone()),
        (
            "value_c_type".to_string(),
            value_c_type(value.kind).to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::sample_project;

    #[test]
    fn object_mutator_has_no_rule() {
        let mut project = sample_project();
        project.types[0].values = serde_json::from_value(serde_json::json!([
            { "name": "root_item", "description": "root item", "kind": "object",
              "is_settable": true },
        ]))
        .expect("values json");
        let error = plans(&project, 0).unwrap_err();
        assert_eq!(error.exit_code(), 4);
        assert!(error.to_string().starts_with("PlanError"));
    }

    #[test]
    fn absence_semantics_select_the_accessor_variant() {
        let mut project = sample_project();
        project.types[0].values = serde_json::from_value(serde_json::json!([
            { "name": "serial", "description": "serial number", "kind": "uint32",
              "is_set": true },
            { "name": "size", "description": "size", "kind": "uint64" },
            { "name": "label", "description": "label", "kind": "string",
              "has_value": true },
        ]))
        .expect("values json");
        let plans = plans(&project, 0).expect("plans");
        let stems: Vec<String> = plans[0].entries.iter().map(|e| e.key.stem()).collect();
        assert!(stems.contains(&"get_uint32_value-is_set".to_string()));
        assert!(stems.contains(&"get_uint64_value".to_string()));
        assert!(!stems.contains(&"get_uint64_value-is_set".to_string()));
        assert!(stems.contains(&"get_string_value-is_set".to_string()));
        assert!(stems.contains(&"init-with_input".to_string()));
    }
}
