//! File access used by the parsers and the editor
//!
//! Parsing, search and editing go through [`FileStore`] instead of touching
//! the filesystem directly, so they can run against an in-memory tree in
//! tests or embedders.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Read/write access to source files
pub trait FileStore: Send + Sync {
    /// Read a whole file as UTF-8 text
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Replace a whole file
    fn write_file(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check whether a file exists
    fn exists(&self, path: &Path) -> bool;
}

/// The local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FileStore for FsStore {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// An in-memory file tree
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    /// Current content of a file
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.read().get(path).cloned()
    }
}

impl FileStore for MemoryStore {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.insert(path, content);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}
