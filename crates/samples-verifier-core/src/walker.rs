//! Document walking: which files under a checkout get scanned, and the lazy
//! stream of code units they produce.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use ignore::{Walk, WalkBuilder};

use crate::domain::{Code, FileType, Result};
use crate::extract::SnippetExtractor;
use crate::obs;

/// Recursively lists documents of one [`FileType`] under a root directory.
///
/// Every path is visited, including hidden and git-ignored files; only the
/// repository's own `.git` directory is skipped. Entries are sorted by file
/// name so the visitation order is stable across runs.
pub struct DocumentWalker {
    walk: Walk,
    file_type: FileType,
}

impl DocumentWalker {
    pub fn new(root: &Path, file_type: FileType) -> Self {
        let walk = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(|entry| entry.file_name() != OsStr::new(".git"))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        Self { walk, file_type }
    }
}

impl Iterator for DocumentWalker {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if is_file && has_extension(entry.path(), self.file_type) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

/// Exact, case-sensitive extension match.
pub fn has_extension(path: &Path, file_type: FileType) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == file_type.extension())
}

/// Lazy producer of code units: walks documents and extracts each one only
/// when the previous document's code units have been consumed.
///
/// Walking and extraction are synchronous and run inline on the polling task;
/// the pipeline drives one run at a time.
pub struct SnippetStream<'a, E: ?Sized> {
    files: DocumentWalker,
    extractor: &'a E,
    file_type: FileType,
    attributes: &'a [String],
    pending: std::vec::IntoIter<Code>,
}

impl<'a, E: SnippetExtractor + ?Sized> SnippetStream<'a, E> {
    pub fn new(
        root: &Path,
        file_type: FileType,
        attributes: &'a [String],
        extractor: &'a E,
    ) -> Self {
        Self {
            files: DocumentWalker::new(root, file_type),
            extractor,
            file_type,
            attributes,
            pending: Vec::new().into_iter(),
        }
    }
}

impl<E: SnippetExtractor + ?Sized> Iterator for SnippetStream<'_, E> {
    type Item = Result<Code>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(code) = self.pending.next() {
                return Some(Ok(code));
            }
            let path = match self.files.next()? {
                Ok(path) => path,
                Err(err) => return Some(Err(err)),
            };
            obs::emit_file_processing(&path);
            match self
                .extractor
                .extract(&path, self.file_type, self.attributes)
            {
                Ok(codes) => self.pending = codes.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
