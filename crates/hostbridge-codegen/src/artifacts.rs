//! Generated artifacts and committing them to disk.
//!
//! Each artifact starts with a short header carrying the xxh64 fingerprint
//! of its body. Writing stages every changed file in a temporary directory
//! next to the destination and renames it into place, so readers never see
//! a half-written artifact. Files whose on-disk fingerprint matches are left
//! untouched.

use std::fs;
use std::path::{Path, PathBuf};

use hostbridge_core::GenerationError;
use tracing::{debug, info};
use xxhash_rust::xxh64::xxh64;

use crate::options::GeneratorOptions;

const LOG_TARGET: &str = "hostbridge::codegen";
const FINGERPRINT_PREFIX: &str = "// fingerprint: ";

/// Which side of the boundary an artifact is compiled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Native,
    Managed,
}

impl ArtifactKind {
    fn header(self) -> &'static str {
        match self {
            ArtifactKind::Native => "// @generated by hostbridge-codegen. Do not edit.\n",
            ArtifactKind::Managed => "// <auto-generated/>\n// Generated by hostbridge-codegen. Do not edit.\n",
        }
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub fingerprint: u64,
    contents: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, file_name: impl Into<String>, body: String) -> Self {
        let fingerprint = xxh64(body.as_bytes(), 0);
        let contents = format!("{}{FINGERPRINT_PREFIX}{fingerprint:016x}\n\n{body}", kind.header());
        Self {
            kind,
            file_name: file_name.into(),
            fingerprint,
            contents,
        }
    }

    /// The full file text, header included.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Whether `text` is this artifact, judged by fingerprint.
    pub fn matches(&self, text: &str) -> bool {
        verified_fingerprint(text) == Some(self.fingerprint)
    }
}

/// The fingerprint recorded in `text`, provided its body still hashes to
/// it. Hand-edited files yield `None`.
pub fn verified_fingerprint(text: &str) -> Option<u64> {
    let (header, body) = text.split_once("\n\n")?;
    let recorded = header
        .lines()
        .find_map(|line| line.strip_prefix(FINGERPRINT_PREFIX))
        .and_then(|hex| u64::from_str_radix(hex.trim(), 16).ok())?;
    (xxh64(body.as_bytes(), 0) == recorded).then_some(recorded)
}

/// Outcome of [`Artifacts::write_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Outcome of [`Artifacts::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Artifacts that are missing, edited or out of date.
    pub stale: Vec<PathBuf>,
}

impl CheckReport {
    pub fn is_up_to_date(&self) -> bool {
        self.stale.is_empty()
    }
}

/// The native and managed artifacts of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub native: Artifact,
    pub managed: Artifact,
}

impl Artifacts {
    pub fn new(options: &GeneratorOptions, native: String, managed: String) -> Self {
        Self {
            native: Artifact::new(ArtifactKind::Native, &options.native_file, native),
            managed: Artifact::new(ArtifactKind::Managed, &options.managed_file, managed),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        [&self.native, &self.managed].into_iter()
    }

    /// Commit the artifacts into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<WriteReport, GenerationError> {
        fs::create_dir_all(dir).map_err(|e| output_error(dir, e))?;

        let mut report = WriteReport::default();
        let mut changed = Vec::new();
        for artifact in self.iter() {
            let path = dir.join(&artifact.file_name);
            if is_current(artifact, &path) {
                debug!(target: LOG_TARGET, path = %path.display(), "artifact unchanged");
                report.unchanged.push(path);
            } else {
                changed.push((artifact, path));
            }
        }
        if changed.is_empty() {
            return Ok(report);
        }

        // Stage on the same filesystem so the final renames are atomic
        let staging = tempfile::Builder::new()
            .prefix(".hostbridge-staging")
            .tempdir_in(dir)
            .map_err(|e| output_error(dir, e))?;
        let mut staged = Vec::with_capacity(changed.len());
        for (artifact, path) in changed {
            let temp = staging.path().join(&artifact.file_name);
            fs::write(&temp, artifact.contents()).map_err(|e| output_error(&temp, e))?;
            staged.push((temp, path));
        }
        for (temp, path) in staged {
            fs::rename(&temp, &path).map_err(|e| output_error(&path, e))?;
            info!(target: LOG_TARGET, path = %path.display(), "artifact written");
            report.written.push(path);
        }
        Ok(report)
    }

    /// Report which artifacts in `dir` differ from these, without writing.
    pub fn check(&self, dir: &Path) -> CheckReport {
        let stale = self
            .iter()
            .map(|artifact| (artifact, dir.join(&artifact.file_name)))
            .filter(|(artifact, path)| !is_current(artifact, path))
            .map(|(_, path)| path)
            .collect();
        CheckReport { stale }
    }
}

fn is_current(artifact: &Artifact, path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|text| artifact.matches(&text))
}

fn output_error(path: &Path, error: std::io::Error) -> GenerationError {
    GenerationError::Output {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifacts(body: &str) -> Artifacts {
        Artifacts::new(&GeneratorOptions::default(), format!("pub struct A;\n{body}"), "namespace A\n{\n}\n".into())
    }

    #[test]
    fn header_carries_a_verifiable_fingerprint() {
        let artifact = Artifact::new(ArtifactKind::Native, "bindings.rs", "pub struct A;\n".into());
        assert!(artifact.contents().starts_with("// @generated by hostbridge-codegen. Do not edit.\n"));
        assert_eq!(verified_fingerprint(artifact.contents()), Some(artifact.fingerprint));

        let edited = artifact.contents().replace("struct A", "struct B");
        assert_eq!(verified_fingerprint(&edited), None);
    }

    #[test]
    fn unchanged_artifacts_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let first = artifacts("").write_to(dir.path()).unwrap();
        assert_eq!(first.written.len(), 2);
        assert!(first.unchanged.is_empty());

        let second = artifacts("").write_to(dir.path()).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), 2);

        let third = artifacts("pub struct C;\n").write_to(dir.path()).unwrap();
        assert_eq!(third.written, vec![dir.path().join("bindings.rs")]);
        assert_eq!(third.unchanged, vec![dir.path().join("Bindings.g.cs")]);
    }

    #[test]
    fn staging_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        artifacts("").write_to(dir.path()).unwrap();
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Bindings.g.cs", "bindings.rs"]);
    }

    #[test]
    fn check_reports_missing_and_edited_files() {
        let dir = tempfile::tempdir().unwrap();
        let generated = artifacts("");
        assert_eq!(generated.check(dir.path()).stale.len(), 2);

        generated.write_to(dir.path()).unwrap();
        assert!(generated.check(dir.path()).is_up_to_date());

        let path = dir.path().join("bindings.rs");
        let edited = fs::read_to_string(&path).unwrap().replace("struct A", "struct Z");
        fs::write(&path, edited).unwrap();
        assert_eq!(generated.check(dir.path()).stale, vec![path]);
    }
}
