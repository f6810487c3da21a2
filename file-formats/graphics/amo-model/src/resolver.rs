//! Resource resolution for AMO files
//!
//! A loader never opens files itself; it asks a [`ResourceResolver`] for a
//! readable stream by name. This keeps packaged assets, archives and tests on
//! the same code path as plain files.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{AmoError, Result};

/// Trait for turning a resource name into a readable stream
pub trait ResourceResolver {
    /// Open the named resource
    ///
    /// A resource that does not exist is [`AmoError::ResourceNotFound`].
    fn open(&self, name: &str) -> Result<Box<dyn BufRead + Send>>;

    /// Check whether the named resource can be opened
    fn exists(&self, name: &str) -> bool {
        self.open(name).is_ok()
    }
}

/// Resolver reading files relative to a base directory
#[derive(Debug, Clone)]
pub struct FsResolver {
    base_path: PathBuf,
}

impl FsResolver {
    /// Create a resolver rooted at `base_path`
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Resolver for paths taken as given (relative to the working directory)
    pub fn current_dir() -> Self {
        Self::new("")
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full path for a resource name
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::current_dir()
    }
}

impl ResourceResolver for FsResolver {
    fn open(&self, name: &str) -> Result<Box<dyn BufRead + Send>> {
        let path = self.resolve_path(name);
        log::debug!("Opening {}", path.display());

        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AmoError::ResourceNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(AmoError::Io(e)),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve_path(name).is_file()
    }
}

/// Resolver serving resources held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource
    pub fn insert<S: Into<String>, B: Into<Vec<u8>>>(&mut self, name: S, data: B) {
        self.resources.insert(name.into(), data.into());
    }

    /// Builder form of [`MemoryResolver::insert`]
    pub fn with<S: Into<String>, B: Into<Vec<u8>>>(mut self, name: S, data: B) -> Self {
        self.insert(name, data);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.resources.remove(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceResolver for MemoryResolver {
    fn open(&self, name: &str) -> Result<Box<dyn BufRead + Send>> {
        let data = self
            .resources
            .get(name)
            .ok_or_else(|| AmoError::ResourceNotFound {
                name: name.to_string(),
            })?;
        Ok(Box::new(Cursor::new(data.clone())))
    }

    fn exists(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;

    fn read_all(mut reader: Box<dyn BufRead + Send>) -> String {
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_fs_resolver() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("models")).unwrap();
        fs::write(temp_dir.path().join("models/cube.amo"), "v 0 0 0\n").unwrap();

        let resolver = FsResolver::new(temp_dir.path());
        assert!(resolver.exists("models/cube.amo"));
        assert_eq!(read_all(resolver.open("models/cube.amo").unwrap()), "v 0 0 0\n");
    }

    #[test]
    fn test_fs_resolver_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let resolver = FsResolver::new(temp_dir.path());

        assert!(!resolver.exists("nope.amo"));
        match resolver.open("nope.amo") {
            Err(AmoError::ResourceNotFound { name }) => assert_eq!(name, "nope.amo"),
            other => panic!("expected ResourceNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new().with("a.amo", "v 1 2 3\n");
        resolver.insert("b.amo", b"j root -1\n".to_vec());

        assert_eq!(resolver.len(), 2);
        assert!(resolver.exists("a.amo"));
        assert_eq!(read_all(resolver.open("b.amo").unwrap()), "j root -1\n");

        // Each open is an independent stream
        assert_eq!(read_all(resolver.open("a.amo").unwrap()), "v 1 2 3\n");
        assert_eq!(read_all(resolver.open("a.amo").unwrap()), "v 1 2 3\n");

        assert!(resolver.remove("a.amo").is_some());
        assert!(matches!(
            resolver.open("a.amo"),
            Err(AmoError::ResourceNotFound { .. })
        ));
    }
}
