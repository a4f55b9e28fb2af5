//! The emitter: canonical, atomic file output.
//!
//! Every artifact is normalized (LF line endings, trailing whitespace
//! stripped, exactly one trailing newline), written to a sibling temp file
//! and renamed into place, so a file is either fully written or absent.
//! Dry-run mode prints a unified diff against the on-disk content and
//! writes nothing.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use globset::GlobSet;
use log::debug;
use similar::TextDiff;

use crate::error::{Error, Result};

/// One composed output file, path relative to the output root.
#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub text: String,
    pub executable: bool,
}

#[derive(Debug, Default)]
pub struct EmitSummary {
    /// Files written (or, in dry-run mode, that would be written).
    pub written: usize,
    /// Files whose content differs from what was on disk.
    pub changed: usize,
}

pub struct Emitter {
    out_dir: PathBuf,
    dry_run: bool,
    only: Option<GlobSet>,
    /// Temp names carry the pid and this counter to avoid collisions.
    counter: u64,
}

/// Canonical form: LF only, no trailing whitespace, one trailing newline.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

impl Emitter {
    pub fn new(out_dir: &Path, dry_run: bool, only: Option<GlobSet>) -> Self {
        Emitter {
            out_dir: out_dir.to_path_buf(),
            dry_run,
            only,
            counter: 0,
        }
    }

    fn selected(&self, path: &Path) -> bool {
        self.only
            .as_ref()
            .is_none_or(|globs| globs.is_match(path))
    }

    /// Emit every artifact; the whole list is staged in memory before this
    /// is called, so a failure here never leaves a half-written file.
    pub fn emit_all(&mut self, artifacts: &[Artifact]) -> Result<EmitSummary> {
        let mut summary = EmitSummary::default();
        for artifact in artifacts {
            if !self.selected(&artifact.path) {
                continue;
            }
            let changed = self.emit_one(artifact)?;
            summary.written += 1;
            if changed {
                summary.changed += 1;
            }
        }
        Ok(summary)
    }

    fn emit_one(&mut self, artifact: &Artifact) -> Result<bool> {
        let target = self.out_dir.join(&artifact.path);
        let text = normalize(&artifact.text);
        let existing = fs::read_to_string(&target).unwrap_or_default();
        let changed = existing != text;

        if self.dry_run {
            if changed {
                let relative = artifact.path.display();
                let diff = TextDiff::from_lines(&existing, &text);
                print!(
                    "{}",
                    diff.unified_diff()
                        .context_radius(3)
                        .header(&format!("a/{relative}"), &format!("b/{relative}"))
                );
            }
            return Ok(changed);
        }

        let parent = target
            .parent()
            .ok_or_else(|| Error::Internal(format!("no parent for {}", target.display())))?;
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let stem = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{stem}.{}.{}.", process::id(), self.counter))
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        self.counter += 1;

        temp.write_all(text.as_bytes())
            .map_err(|e| Error::io(temp.path(), e))?;

        #[cfg(unix)]
        if artifact.executable {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::io(temp.path(), e))?;
        }

        temp.persist(&target)
            .map_err(|e| Error::io(&target, e.error))?;
        debug!("wrote {}", target.display());
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_canonical() {
        assert_eq!(normalize("a  \r\nb\t\r\nc"), "a\nb\nc\n");
        assert_eq!(normalize("a\n\n\n"), "a\n");
        assert_eq!(normalize("a\n\nb\n"), "a\n\nb\n");
    }

    fn artifact(path: &str, text: &str) -> Artifact {
        Artifact {
            path: PathBuf::from(path),
            text: text.to_string(),
            executable: false,
        }
    }

    #[test]
    fn writes_are_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut emitter = Emitter::new(dir.path(), false, None);
        let artifacts = vec![artifact("libsample/libsample_error.c", "int x;  \n")];

        let first = emitter.emit_all(&artifacts).expect("first run");
        assert_eq!(first.written, 1);
        assert_eq!(first.changed, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("libsample/libsample_error.c")).expect("read"),
            "int x;\n"
        );

        let second = emitter.emit_all(&artifacts).expect("second run");
        assert_eq!(second.changed, 0);
    }

    #[test]
    fn dry_run_reports_but_never_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = vec![artifact("out.c", "int x;\n")];

        let mut dry = Emitter::new(dir.path(), true, None);
        let summary = dry.emit_all(&artifacts).expect("dry run");
        assert_eq!(summary.changed, 1);
        assert!(!dir.path().join("out.c").exists());

        let mut wet = Emitter::new(dir.path(), false, None);
        wet.emit_all(&artifacts).expect("write");

        // Diff iff a non-dry run would change the tree.
        let mut dry = Emitter::new(dir.path(), true, None);
        let summary = dry.emit_all(&artifacts).expect("dry run after write");
        assert_eq!(summary.changed, 0);
    }

    #[test]
    fn only_glob_restricts_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let globs = globset::GlobSetBuilder::new()
            .add(globset::Glob::new("tests/**").expect("glob"))
            .build()
            .expect("globset");
        let mut emitter = Emitter::new(dir.path(), false, Some(globs));
        let artifacts = vec![
            artifact("tests/sample_test_widget.c", "int t;\n"),
            artifact("libsample/libsample_widget.c", "int w;\n"),
        ];
        let summary = emitter.emit_all(&artifacts).expect("emit");
        assert_eq!(summary.written, 1);
        assert!(dir.path().join("tests/sample_test_widget.c").exists());
        assert!(!dir.path().join("libsample/libsample_widget.c").exists());
    }

    #[cfg(unix)]
    #[test]
    fn scripts_get_the_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut emitter = Emitter::new(dir.path(), false, None);
        let artifacts = vec![Artifact {
            path: PathBuf::from("tests/runtests.sh"),
            text: "#!/bin/sh\n".to_string(),
            executable: true,
        }];
        emitter.emit_all(&artifacts).expect("emit");
        let mode = fs::metadata(dir.path().join("tests/runtests.sh"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
