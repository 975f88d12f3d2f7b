use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The edit primitive: text inserted at a byte offset.
///
/// Field insertion never removes source text, so an edit is an empty span
/// plus the text that goes into it. Intelligence lives in span acquisition
/// (the locator), not in application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TextEdit does nothing until applied"]
pub struct TextEdit {
    /// Byte offset the text is inserted at
    pub offset: usize,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid byte offset {offset} in text of length {len}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("Edit boundary splits a UTF-8 character at byte {0}")]
    CharBoundary(usize),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TextEdit {
    /// Insert `text` at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }

    fn validate(&self, content: &str) -> Result<(), EditError> {
        if self.offset > content.len() {
            return Err(EditError::InvalidOffset {
                offset: self.offset,
                len: content.len(),
            });
        }
        if !content.is_char_boundary(self.offset) {
            return Err(EditError::CharBoundary(self.offset));
        }
        Ok(())
    }
}

/// Apply several insertions to one text.
///
/// Edits are validated against the original text and applied bottom-to-top
/// so earlier offsets stay valid. Insertions sharing an offset keep their
/// given order in the output.
pub fn apply_edits(content: &str, edits: Vec<TextEdit>) -> Result<String, EditError> {
    for edit in &edits {
        edit.validate(content)?;
    }

    let mut ordered: Vec<(usize, TextEdit)> = edits.into_iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| b.offset.cmp(&a.offset).then(ib.cmp(ia)));

    let mut result = content.to_string();
    for (_, edit) in &ordered {
        result.insert_str(edit.offset, &edit.text);
    }

    Ok(result)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the original file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let write_err = |source: std::io::Error| EditError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Same directory so the rename never crosses filesystems
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    // Keep the original permission bits
    if let Ok(meta) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }

    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
