//! Runner - drives selection, patching and write-back for one invocation
//!
//! Every candidate produces exactly one [`FileReport`]. A failure on one file
//! is recorded as [`FileOutcome::Failed`] and never stops the run.

use crate::edit::{atomic_write, EditError};
use crate::engine::{EngineError, Insertion, PatchEngine};
use crate::safety::{SafetyError, WorkspaceGuard};
use crate::select::Candidate;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single file could not be processed.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Write(#[from] EditError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Synthesized fields were inserted (or would be, in a dry run)
    Changed { insertions: Vec<Insertion> },
    /// No rule matched
    Unchanged,
    Failed { reason: String },
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Changed { insertions } => {
                write!(f, "changed ({} call sites)", insertions.len())
            }
            FileOutcome::Unchanged => write!(f, "unchanged"),
            FileOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Workspace-relative path when inside the workspace
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    /// Original and patched text, kept for diff display
    #[serde(skip)]
    pub texts: Option<(String, String)>,
}

impl FileReport {
    pub fn is_changed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Changed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn changed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_changed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.files.len() - self.changed_count() - self.failed_count()
    }
}

pub struct Runner<'a> {
    engine: &'a PatchEngine,
    guard: &'a WorkspaceGuard,
    dry_run: bool,
}

impl<'a> Runner<'a> {
    pub fn new(engine: &'a PatchEngine, guard: &'a WorkspaceGuard) -> Self {
        Self {
            engine,
            guard,
            dry_run: false,
        }
    }

    /// Report what would change without writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every candidate in order, calling `on_file` as each finishes.
    pub fn run(&self, candidates: &[Candidate], mut on_file: impl FnMut(&FileReport)) -> RunReport {
        let mut report = RunReport::default();
        for candidate in candidates {
            let file_report = self.process(candidate);
            on_file(&file_report);
            report.files.push(file_report);
        }
        report
    }

    pub fn process(&self, candidate: &Candidate) -> FileReport {
        let display = self.display_path(candidate.path());
        match self.try_process(candidate) {
            Ok(None) => FileReport {
                path: display,
                outcome: FileOutcome::Unchanged,
                texts: None,
            },
            Ok(Some((insertions, original, patched))) => FileReport {
                path: display,
                outcome: FileOutcome::Changed { insertions },
                texts: Some((original, patched)),
            },
            Err(err) => FileReport {
                path: display,
                outcome: FileOutcome::Failed {
                    reason: err.to_string(),
                },
                texts: None,
            },
        }
    }

    #[allow(clippy::type_complexity)]
    fn try_process(
        &self,
        candidate: &Candidate,
    ) -> Result<Option<(Vec<Insertion>, String, String)>, FileError> {
        let path = match candidate {
            Candidate::File(path) => path,
            Candidate::Unreadable { path, reason } => {
                return Err(FileError::Walk {
                    path: path.clone(),
                    reason: reason.clone(),
                })
            }
        };

        let canonical = self.guard.validate_path(path)?;
        let original = fs::read_to_string(&canonical).map_err(|source| FileError::Read {
            path: path.clone(),
            source,
        })?;

        let outcome = self.engine.apply(&original)?;
        if !outcome.changed {
            return Ok(None);
        }

        if !self.dry_run {
            let target = self.guard.revalidate(&canonical)?;
            atomic_write(&target, outcome.text.as_bytes())?;
        }

        Ok(Some((outcome.insertions, original, outcome.text)))
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        self.guard.relative(path).to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_builtin;
    use crate::select::FileSelector;

    const COMMENT_ROUTE: &str = "await prisma.comment.create({\n  data: {\n    content,\n  },\n});\n";

    #[test]
    fn test_partial_failure_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let ws = dir.path().canonicalize().unwrap();
        fs::write(ws.join("one.ts"), COMMENT_ROUTE).unwrap();
        fs::write(ws.join("three.ts"), "export const x = 1;\n").unwrap();

        let config = load_builtin().unwrap();
        let engine = PatchEngine::new(&config).unwrap();
        let guard = WorkspaceGuard::new(&ws, config.select.walk.skip_dirs.as_slice()).unwrap();
        let selector = FileSelector::List(vec![
            "one.ts".to_string(),
            "two.ts".to_string(),
            "three.ts".to_string(),
        ]);

        let mut seen = Vec::new();
        let report = Runner::new(&engine, &guard).run(&selector.select(&ws), |f| {
            seen.push(f.path.clone())
        });

        assert_eq!(seen.len(), 3);
        assert_eq!(report.changed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.unchanged_count(), 1);
        assert!(report.files[1].is_failed());
        assert_eq!(report.files[1].path, PathBuf::from("two.ts"));
        assert!(fs::read_to_string(ws.join("one.ts"))
            .unwrap()
            .contains("id: crypto.randomUUID()"));
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ws = dir.path();
        fs::write(ws.join("route.ts"), COMMENT_ROUTE).unwrap();

        let config = load_builtin().unwrap();
        let engine = PatchEngine::new(&config).unwrap();
        let guard = WorkspaceGuard::new(ws, &["node_modules"]).unwrap();

        let report = Runner::new(&engine, &guard)
            .dry_run(true)
            .run(&[Candidate::File(ws.join("route.ts"))], |_| {});

        assert_eq!(report.changed_count(), 1);
        let (before, after) = report.files[0].texts.clone().unwrap();
        assert_eq!(before, COMMENT_ROUTE);
        assert!(after.contains("updatedAt: new Date()"));
        assert_eq!(fs::read_to_string(ws.join("route.ts")).unwrap(), COMMENT_ROUTE);
    }

    #[test]
    fn test_non_utf8_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ws = dir.path();
        fs::write(ws.join("bin.ts"), [0xff, 0xfe, 0x00]).unwrap();

        let config = load_builtin().unwrap();
        let engine = PatchEngine::new(&config).unwrap();
        let guard = WorkspaceGuard::new(ws, &["node_modules"]).unwrap();

        let report = Runner::new(&engine, &guard).run(&[Candidate::File(ws.join("bin.ts"))], |_| {});
        match &report.files[0].outcome {
            FileOutcome::Failed { reason } => assert!(reason.contains("cannot read")),
            other => panic!("unexpected outcome: {other}"),
        }
    }
}
