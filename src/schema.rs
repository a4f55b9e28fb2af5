//! Schema loader: per-project configuration -> validated `Project`.
//!
//! The input is a project directory holding a main `project.json` plus
//! optional auxiliary files under `structures/` and `codepages/` (one
//! structure or codepage table per file). Auxiliary files are merged in
//! sorted filename order so repeated runs see the same model.
//!
//! Loading never partially succeeds: the first violation aborts with a
//! `SchemaError` naming the file and the path inside the schema.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike};
use log::info;

use crate::error::{Error, Result};
use crate::model::{
    CodepageTable, MemberKind, Project, SignatureValue, Structure, ValueKind,
};

/// Load and validate the project configuration.
///
/// `config_path` is either the project directory or the main configuration
/// file inside it.
pub fn load(config_path: &Path) -> Result<Project> {
    let (dir, main_file) = if config_path.is_dir() {
        (config_path.to_path_buf(), config_path.join("project.json"))
    } else {
        let dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (dir, config_path.to_path_buf())
    };

    let text = fs::read_to_string(&main_file).map_err(|e| Error::io(&main_file, e))?;
    let mut project: Project = serde_json::from_str(&text).map_err(|e| Error::Schema {
        file: main_file.clone(),
        path: format!("line {} column {}", e.line(), e.column()),
        message: e.to_string(),
    })?;

    for path in aux_files(&dir.join("structures"))? {
        let structure: Structure = read_aux(&path)?;
        project.structures.push(structure);
    }
    for path in aux_files(&dir.join("codepages"))? {
        let codepage: CodepageTable = read_aux(&path)?;
        project.codepages.push(codepage);
    }

    project.copyright = resolve_copyright(&project.copyright);

    validate(&project, &main_file)?;

    info!(
        "loaded project `{}`: {} structures, {} types, {} codepages",
        project.project_name,
        project.structures.len(),
        project.types.len(),
        project.codepages.len()
    );
    Ok(project)
}

/// Auxiliary `*.json` files in sorted order; an absent directory is fine.
fn aux_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_aux<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| Error::Schema {
        file: path.to_path_buf(),
        path: format!("line {} column {}", e.line(), e.column()),
        message: e.to_string(),
    })
}

/// `SOURCE_DATE_EPOCH` overrides the final year of the copyright range.
fn resolve_copyright(copyright: &str) -> String {
    let Ok(raw) = env::var("SOURCE_DATE_EPOCH") else {
        return copyright.to_string();
    };
    let Some(year) = raw
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|stamp| stamp.year())
    else {
        return copyright.to_string();
    };
    match copyright.split_once('-') {
        Some((start, _)) => format!("{start}-{year}"),
        None => year.to_string(),
    }
}

/// `[a-z][a-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn validate(project: &Project, file: &Path) -> Result<()> {
    let fail = |path: String, message: String| -> Error {
        Error::Schema {
            file: file.to_path_buf(),
            path,
            message,
        }
    };

    for (path, name) in [
        ("project_name", &project.project_name),
        ("library_name", &project.library_name),
        ("python_module_name", &project.python_module_name),
        ("tools_name", &project.tools_name),
    ] {
        if !is_identifier(name) {
            return Err(fail(
                path.to_string(),
                format!("`{name}` is not a lowercase identifier"),
            ));
        }
    }
    if !project.library_name.starts_with("lib") || project.library_name.len() <= 3 {
        return Err(fail(
            "library_name".to_string(),
            format!("`{}` must start with `lib`", project.library_name),
        ));
    }

    for (i, structure) in project.structures.iter().enumerate() {
        validate_structure(structure, i, &fail)?;
    }

    for (i, handle_type) in project.types.iter().enumerate() {
        let base = format!("types[{i}]");
        if !is_identifier(&handle_type.name) {
            return Err(fail(
                format!("{base}.name"),
                format!("`{}` is not a lowercase identifier", handle_type.name),
            ));
        }
        for (j, value) in handle_type.values.iter().enumerate() {
            let vpath = format!("{base}.values[{j}]");
            if !is_identifier(&value.name) {
                return Err(fail(
                    format!("{vpath}.name"),
                    format!("`{}` is not a lowercase identifier", value.name),
                ));
            }
            if value.lookup.is_some() && value.kind != ValueKind::Object {
                return Err(fail(
                    format!("{vpath}.lookup"),
                    "lookup is only valid for object values".to_string(),
                ));
            }
            if value.is_settable && value.kind == ValueKind::Object {
                return Err(fail(
                    format!("{vpath}.is_settable"),
                    "object values have no mutator".to_string(),
                ));
            }
        }
    }

    for (i, codepage) in project.codepages.iter().enumerate() {
        let base = format!("codepages[{i}]");
        if !is_identifier(&codepage.name) {
            return Err(fail(
                format!("{base}.name"),
                format!("`{}` is not a lowercase identifier", codepage.name),
            ));
        }
        // The byte -> codepoint direction must be total over 0-255.
        let mut seen = [false; 256];
        for (j, mapping) in codepage.mapping.iter().enumerate() {
            if seen[mapping.byte as usize] {
                return Err(fail(
                    format!("{base}.mapping[{j}]"),
                    format!("byte 0x{:02x} mapped twice", mapping.byte),
                ));
            }
            seen[mapping.byte as usize] = true;
        }
        if codepage.mapping.len() != 256 || seen.iter().any(|covered| !covered) {
            return Err(fail(
                format!("{base}.mapping"),
                format!(
                    "mapping must be total over 0-255, has {} entries",
                    codepage.mapping.len()
                ),
            ));
        }
    }

    if let Some(info_tool) = &project.info_tool {
        let mut letters = Vec::new();
        for (i, option) in info_tool.options.iter().enumerate() {
            let base = format!("info_tool.options[{i}]");
            if !option.letter.is_ascii_alphabetic() {
                return Err(fail(
                    format!("{base}.letter"),
                    format!("`{}` is not an ASCII letter", option.letter),
                ));
            }
            if letters.contains(&option.letter) {
                return Err(fail(
                    format!("{base}.letter"),
                    format!("option letter `{}` declared twice", option.letter),
                ));
            }
            letters.push(option.letter);
        }
    }

    Ok(())
}

fn validate_structure(
    structure: &Structure,
    index: usize,
    fail: &dyn Fn(String, String) -> Error,
) -> Result<()> {
    let base = format!("structures[{index}]");
    if !is_identifier(&structure.name) {
        return Err(fail(
            format!("{base}.name"),
            format!("`{}` is not a lowercase identifier", structure.name),
        ));
    }
    if structure.members.is_empty() {
        return Err(fail(
            format!("{base}.members"),
            "structure has no members".to_string(),
        ));
    }
    for (j, member) in structure.members.iter().enumerate() {
        let mpath = format!("{base}.members[{j}]");
        if !is_identifier(&member.name) {
            return Err(fail(
                format!("{mpath}.name"),
                format!("`{}` is not a lowercase identifier", member.name),
            ));
        }
        match (member.kind.implied_width(), member.width_bytes) {
            (Some(implied), Some(declared)) if implied != declared => {
                return Err(fail(
                    format!("{mpath}.width_bytes"),
                    format!("kind implies width {implied}, schema says {declared}"),
                ));
            }
            (None, None) => {
                return Err(fail(
                    format!("{mpath}.width_bytes"),
                    "kind has no implied width, width_bytes is required".to_string(),
                ));
            }
            _ => {}
        }
        match member.kind {
            MemberKind::SignatureStream => match &member.value {
                Some(SignatureValue::Stream(literal)) => {
                    if literal.len() as u32 != member.width() {
                        return Err(fail(
                            format!("{mpath}.value"),
                            format!(
                                "signature `{literal}` is {} bytes, member is {}",
                                literal.len(),
                                member.width()
                            ),
                        ));
                    }
                }
                Some(SignatureValue::Integer(_)) => {
                    return Err(fail(
                        format!("{mpath}.value"),
                        "stream signature requires a string literal".to_string(),
                    ));
                }
                None => {
                    return Err(fail(
                        format!("{mpath}.value"),
                        "signature member requires a literal value".to_string(),
                    ));
                }
            },
            MemberKind::SignatureInteger => {
                if !matches!(member.width(), 1 | 2 | 4 | 8) {
                    return Err(fail(
                        format!("{mpath}.width_bytes"),
                        format!("integer signature width {} is not 1/2/4/8", member.width()),
                    ));
                }
                match &member.value {
                    Some(SignatureValue::Integer(_)) => {}
                    _ => {
                        return Err(fail(
                            format!("{mpath}.value"),
                            "integer signature requires an integer literal".to_string(),
                        ));
                    }
                }
            }
            _ => {
                if member.value.is_some() {
                    return Err(fail(
                        format!("{mpath}.value"),
                        "only signature members carry a literal value".to_string(),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project(structures: serde_json::Value) -> Project {
        serde_json::from_value(serde_json::json!({
            "project_name": "libsample",
            "project_long_name": "library for sample file access",
            "library_name": "libsample",
            "python_module_name": "pysample",
            "tools_name": "sampletools",
            "authors": "Joachim Metz <joachim.metz@gmail.com>",
            "copyright": "2009-2024",
            "structures": structures,
        }))
        .expect("model json")
    }

    #[test]
    fn valid_project_passes() {
        let project = sample_project(serde_json::json!([{
            "name": "widget_header",
            "description": "widget header",
            "members": [
                { "name": "signature", "description": "signature", "kind": "signature_stream",
                  "width_bytes": 2, "value": "WD" },
                { "name": "size", "description": "size", "kind": "le_uint32" },
            ],
        }]));
        validate(&project, Path::new("project.json")).expect("valid");
        assert_eq!(project.library_name_suffix(), "sample");
        assert_eq!(project.structures[0].wire_size(), 6);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let project = sample_project(serde_json::json!([{
            "name": "widget_header",
            "description": "widget header",
            "members": [
                { "name": "size", "description": "size", "kind": "le_uint32",
                  "width_bytes": 8 },
            ],
        }]));
        let error = validate(&project, Path::new("project.json")).unwrap_err();
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().contains("members[0]"));
    }

    #[test]
    fn signature_requires_literal() {
        let project = sample_project(serde_json::json!([{
            "name": "widget_header",
            "description": "widget header",
            "members": [
                { "name": "signature", "description": "signature",
                  "kind": "signature_stream", "width_bytes": 2 },
            ],
        }]));
        assert!(validate(&project, Path::new("project.json")).is_err());
    }

    #[test]
    fn uppercase_identifier_is_rejected() {
        let project = sample_project(serde_json::json!([{
            "name": "WidgetHeader",
            "description": "widget header",
            "members": [
                { "name": "size", "description": "size", "kind": "le_uint32" },
            ],
        }]));
        assert!(validate(&project, Path::new("project.json")).is_err());
    }

    #[test]
    fn partial_codepage_is_rejected() {
        let mut project = sample_project(serde_json::json!([]));
        project.codepages = serde_json::from_value(serde_json::json!([{
            "name": "windows_1252",
            "description": "Windows 1252",
            "mapping": [ { "byte": 0, "codepoint": 0 } ],
        }]))
        .expect("codepage json");
        let error = validate(&project, Path::new("project.json")).unwrap_err();
        assert!(error.to_string().contains("total over 0-255"));
    }

    #[test]
    fn source_date_epoch_overrides_year() {
        // 2001-09-09T01:46:40Z
        unsafe { env::set_var("SOURCE_DATE_EPOCH", "1000000000") };
        assert_eq!(resolve_copyright("2009-2024"), "2009-2001");
        assert_eq!(resolve_copyright("2024"), "2001");
        unsafe { env::remove_var("SOURCE_DATE_EPOCH") };
    }
}
