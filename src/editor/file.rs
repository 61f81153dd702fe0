use std::fs;
use std::path::{Path, PathBuf};

use super::Editor;
use crate::Result;
use crate::markdown::markdown_file_name;

impl Editor {
    /// Replaces the document with the markdown stored at `path`.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "importing markdown file");
        self.import_markdown(&source)
    }

    /// Writes the document to `<title>.md` inside `dir` and returns the path.
    pub fn export_file(&self, dir: impl AsRef<Path>, title: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(markdown_file_name(title));
        fs::write(&path, self.export_markdown())?;
        tracing::debug!(path = %path.display(), "exported markdown file");
        Ok(path)
    }
}
