//! Document corpus loaded from a folder.
//!
//! A [`Corpus`] is an ordered list of `(path, content)` documents. Order is the
//! directory walk order, which is whatever the filesystem enumerates and is
//! not sorted, so two loads of the same tree on different machines may index
//! documents differently. Index `i` always refers to the same document for the
//! lifetime of one corpus, and is the column index of the model fitted on it.

use crate::error::{Result, RetrieverError};
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Pattern selecting plain-text files, used when none is configured
pub const DEFAULT_PATTERN: &str = r"\.txt$";

/// Shared path predicate used by corpus loading and the directory watcher
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// A single file in the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File content, empty once the owning corpus has been released
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered documents discovered under one root folder
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from documents already in memory
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Recursively read every non-directory entry under `root` whose path
    /// satisfies `filter`.
    ///
    /// Hidden files and ignore files get no special treatment and symlinks are
    /// not followed. Content is decoded as UTF-8 with invalid sequences
    /// replaced.
    ///
    /// # Errors
    /// Any failure to enumerate the tree or read a matching file aborts the
    /// load; no partial corpus is returned.
    pub fn load<F>(root: &Path, filter: F) -> Result<Self>
    where
        F: Fn(&Path) -> bool,
    {
        let mut documents = Vec::new();
        for path in Self::matching_files(root, &filter) {
            let path = path?;
            let bytes = std::fs::read(&path).map_err(|e| RetrieverError::io(&path, e))?;
            let content = String::from_utf8_lossy(&bytes).into_owned();
            documents.push(Document { path, content });
        }
        debug!("Loaded {} documents from {}", documents.len(), root.display());
        Ok(Self { documents })
    }

    /// Number of files [`load`](Self::load) would read, without reading them
    pub fn count_matching<F>(root: &Path, filter: F) -> Result<usize>
    where
        F: Fn(&Path) -> bool,
    {
        Self::matching_files(root, &filter).try_fold(0, |n, path| path.map(|_| n + 1))
    }

    fn matching_files<'a, F>(
        root: &Path,
        filter: &'a F,
    ) -> impl Iterator<Item = Result<PathBuf>> + 'a
    where
        F: Fn(&Path) -> bool,
    {
        WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build()
            .filter_map(move |entry| match entry {
                Err(e) => Some(Err(RetrieverError::from(e))),
                Ok(entry) => {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    if is_dir || !filter(entry.path()) {
                        None
                    } else {
                        Some(Ok(entry.into_path()))
                    }
                }
            })
    }

    /// Document contents in corpus order
    pub fn contents(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.content.as_str()).collect()
    }

    /// Document paths in corpus order
    pub fn paths(&self) -> Vec<&Path> {
        self.documents.iter().map(|d| d.path.as_path()).collect()
    }

    /// Path of document `index`
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.documents.get(index).map(|d| d.path.as_path())
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Drop every document's content, keeping paths, count and order
    pub fn release(&mut self) {
        for document in &mut self.documents {
            document.content = String::new();
        }
    }
}

/// Regular-expression filter over full document paths
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Shareable predicate for the reindex coordinator
    pub fn into_filter(self) -> PathFilter {
        Arc::new(move |path: &Path| self.matches(path))
    }
}

impl FromStr for PathPattern {
    type Err = RetrieverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_tree(root: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(root.join("nested/deeper"))?;
        std::fs::write(root.join("one.txt"), "wild weekend at the lake")?;
        std::fs::write(root.join("two.txt"), "quiet evening with books")?;
        std::fs::write(root.join("nested/three.txt"), "market report")?;
        std::fs::write(root.join("nested/deeper/four.txt"), "mountain trip")?;
        std::fs::write(root.join("notes.md"), "# not a text file")?;
        std::fs::write(root.join(".hidden.txt"), "hidden but matching")?;
        Ok(())
    }

    #[test]
    fn test_load_reads_matching_files_recursively() -> Result<()> {
        let dir = tempdir()?;
        write_tree(dir.path())?;
        let pattern = PathPattern::new(DEFAULT_PATTERN)?;

        let corpus = Corpus::load(dir.path(), |p| pattern.matches(p))?;

        assert_eq!(corpus.len(), 5);
        assert_eq!(corpus.contents().len(), corpus.paths().len());
        assert_eq!(
            Corpus::count_matching(dir.path(), |p| pattern.matches(p))?,
            corpus.len()
        );
        for document in corpus.documents() {
            assert!(!document.content().is_empty());
            assert!(document.path().starts_with(dir.path()));
        }
        assert!(corpus.paths().iter().all(|p| !p.ends_with("notes.md")));
        Ok(())
    }

    #[test]
    fn test_contents_align_with_paths() -> Result<()> {
        let dir = tempdir()?;
        write_tree(dir.path())?;
        let corpus = Corpus::load(dir.path(), |p| p.extension().is_some_and(|e| e == "txt"))?;

        for (path, content) in corpus.paths().iter().zip(corpus.contents()) {
            assert_eq!(std::fs::read_to_string(path)?, content);
        }
        Ok(())
    }

    #[test]
    fn test_release_keeps_paths() -> Result<()> {
        let dir = tempdir()?;
        write_tree(dir.path())?;
        let mut corpus = Corpus::load(dir.path(), |_| true)?;
        let before: Vec<PathBuf> = corpus.paths().iter().map(|p| p.to_path_buf()).collect();

        corpus.release();

        assert_eq!(corpus.len(), before.len());
        assert!(corpus.contents().iter().all(|c| c.is_empty()));
        let after: Vec<PathBuf> = corpus.paths().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(before, after);
        assert!(after.iter().all(|p| !p.as_os_str().is_empty()));
        Ok(())
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let result = Corpus::load(&missing, |_| true);
        assert!(matches!(result, Err(RetrieverError::Walk { .. })));
    }

    #[test]
    fn test_empty_folder_gives_empty_corpus() -> Result<()> {
        let dir = tempdir()?;
        let corpus = Corpus::load(dir.path(), |_| true)?;
        assert!(corpus.is_empty());
        assert_eq!(corpus.path(0), None);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_is_replaced() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("bin.txt"), [b'o', b'k', 0xff, b'!'])?;
        let corpus = Corpus::load(dir.path(), |_| true)?;
        assert_eq!(corpus.contents(), vec!["ok\u{fffd}!"]);
        Ok(())
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(matches!(
            PathPattern::new("(unclosed"),
            Err(RetrieverError::InvalidPattern { .. })
        ));
        let pattern: PathPattern = r"\.md$".parse().unwrap();
        assert!(pattern.matches(Path::new("docs/readme.md")));
        assert!(!pattern.matches(Path::new("docs/readme.txt")));
    }
}
