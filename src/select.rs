//! File selection: a fixed path list or a suffix-filtered directory walk.

use crate::config::{Selection, WalkSelection};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A file handed to the patch engine, or a directory entry the walk could
/// not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    File(PathBuf),
    Unreadable { path: PathBuf, reason: String },
}

impl Candidate {
    pub fn path(&self) -> &Path {
        match self {
            Candidate::File(path) => path,
            Candidate::Unreadable { path, .. } => path,
        }
    }
}

/// How candidate files are chosen.
#[derive(Debug, Clone)]
pub enum FileSelector {
    /// Fixed workspace-relative paths, in listed order, unfiltered
    List(Vec<String>),
    /// Every file under a root whose name ends with a suffix
    Walk(WalkSelection),
}

impl FileSelector {
    pub fn list(selection: &Selection) -> Self {
        FileSelector::List(selection.files.clone())
    }

    pub fn walk(selection: &Selection) -> Self {
        FileSelector::Walk(selection.walk.clone())
    }

    pub fn is_walk(&self) -> bool {
        matches!(self, FileSelector::Walk(_))
    }

    /// Produce the ordered candidate list.
    ///
    /// Missing list entries surface when they are opened. A walk root that
    /// is missing or not a directory selects nothing.
    pub fn select(&self, workspace: &Path) -> Vec<Candidate> {
        match self {
            FileSelector::List(files) => files
                .iter()
                .map(|file| Candidate::File(workspace.join(file)))
                .collect(),
            FileSelector::Walk(walk) => walk_candidates(workspace, walk),
        }
    }
}

fn walk_candidates(workspace: &Path, walk: &WalkSelection) -> Vec<Candidate> {
    let root = workspace.join(&walk.root);
    if !root.is_dir() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let entries = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, &walk.skip_dirs));

    for entry in entries {
        match entry {
            Ok(entry) => {
                if is_selected_file(&entry, &walk.suffix) {
                    candidates.push(Candidate::File(entry.into_path()));
                }
            }
            Err(err) => {
                let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                candidates.push(Candidate::Unreadable {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    candidates
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && skip_dirs
            .iter()
            .any(|skip| entry.file_name().to_str() == Some(skip.as_str()))
}

fn is_selected_file(entry: &DirEntry, suffix: &str) -> bool {
    let is_file = entry.file_type().is_file()
        || (entry.path_is_symlink() && entry.path().is_file());
    is_file
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix))
}
