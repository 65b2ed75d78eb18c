//! Script storage capability.
//!
//! The bundler never touches the filesystem directly; it goes through a
//! [`ScriptStore`] injected at the entry point. [`DirectoryStore`] backs the
//! CLI with a real directory, [`MemoryStore`] backs unit tests with an
//! in-memory map.

use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::{FxHashMap, FxHashSet};

/// Sidecar file in which [`DirectoryStore`] persists tags, one
/// `label<TAB>file` entry per line.
pub const TAGS_FILE: &str = ".scriptpack-tags";

/// Flat-namespace file store consumed by the bundler.
///
/// All methods are keyed by plain file name (`Main.js`), never by path;
/// the store decides where those names live.
pub trait ScriptStore {
    fn exists(&self, file: &str) -> bool;

    fn read_text(&self, file: &str) -> io::Result<String>;

    fn write_text(&self, file: &str, content: &str) -> io::Result<()>;

    /// File names in the namespace, sorted for deterministic iteration.
    fn list_files(&self) -> io::Result<Vec<String>>;

    /// Mark a file with a label. Tagging is idempotent.
    fn tag(&self, file: &str, label: &str) -> io::Result<()>;

    fn is_tagged(&self, file: &str, label: &str) -> bool;
}

/// Store over a single real directory, the host's flat script namespace.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn tag_entries(&self) -> Vec<String> {
        match fs::read_to_string(self.base.join(TAGS_FILE)) {
            Ok(text) => text.lines().map(str::to_owned).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl ScriptStore for DirectoryStore {
    fn exists(&self, file: &str) -> bool {
        self.base.join(file).is_file()
    }

    fn read_text(&self, file: &str) -> io::Result<String> {
        fs::read_to_string(self.base.join(file))
    }

    fn write_text(&self, file: &str, content: &str) -> io::Result<()> {
        fs::write(self.base.join(file), content)
    }

    fn list_files(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn tag(&self, file: &str, label: &str) -> io::Result<()> {
        let entry = format!("{label}\t{file}");
        let mut entries = self.tag_entries();
        if entries.iter().any(|line| line == &entry) {
            return Ok(());
        }
        entries.push(entry);
        fs::write(self.base.join(TAGS_FILE), entries.join("\n") + "\n")
    }

    fn is_tagged(&self, file: &str, label: &str) -> bool {
        let entry = format!("{label}\t{file}");
        self.tag_entries().iter().any(|line| line == &entry)
    }
}

/// In-memory store backing unit tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<FxHashMap<String, String>>,
    tags: RefCell<FxHashSet<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a file, replacing any previous content.
    pub fn insert(&self, file: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(file.to_owned(), content.to_owned());
    }

    /// Content of a file, if present.
    pub fn get(&self, file: &str) -> Option<String> {
        self.files.borrow().get(file).cloned()
    }
}

impl ScriptStore for MemoryStore {
    fn exists(&self, file: &str) -> bool {
        self.files.borrow().contains_key(file)
    }

    fn read_text(&self, file: &str) -> io::Result<String> {
        self.files
            .borrow()
            .get(file)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {file}")))
    }

    fn write_text(&self, file: &str, content: &str) -> io::Result<()> {
        self.insert(file, content);
        Ok(())
    }

    fn list_files(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = self.files.borrow().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn tag(&self, file: &str, label: &str) -> io::Result<()> {
        self.tags
            .borrow_mut()
            .insert((file.to_owned(), label.to_owned()));
        Ok(())
    }

    fn is_tagged(&self, file: &str, label: &str) -> bool {
        self.tags
            .borrow()
            .contains(&(file.to_owned(), label.to_owned()))
    }
}
