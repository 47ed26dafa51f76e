//! Files that make up a Tapestry component and case-insensitive lookup of them

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

/// The role a file plays in a component, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TapestryFileKind {
    Java,
    Template,
    Properties,
    JavaScript,
    StyleSheet,
    Other,
}

impl TapestryFileKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("java") => Self::Java,
            Some("tml") => Self::Template,
            Some("properties") => Self::Properties,
            Some("js") => Self::JavaScript,
            Some("css") | Some("less") => Self::StyleSheet,
            _ => Self::Other,
        }
    }
}

/// A file on disk belonging to a component, page or mixin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TapestryFile {
    pub path: PathBuf,
    pub kind: TapestryFileKind,
}

impl TapestryFile {
    pub fn new(path: PathBuf) -> Self {
        let kind = TapestryFileKind::from_path(&path);
        Self { path, kind }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_template_file(&self) -> bool {
        self.kind == TapestryFileKind::Template
    }

    pub fn is_java_file(&self) -> bool {
        self.kind == TapestryFileKind::Java
    }
}

/// All files found for one referenced component name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentContext {
    pub name: String,
    /// Ordered by kind: Java class first, then template, then the rest.
    pub files: Vec<TapestryFile>,
}

impl ComponentContext {
    pub fn new(name: impl Into<String>, mut files: Vec<TapestryFile>) -> Self {
        files.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.path.cmp(&b.path)));
        files.dedup();
        Self { name: name.into(), files }
    }

    /// The file a reference should open first.
    pub fn initial_file(&self) -> Option<&TapestryFile> {
        self.files
            .iter()
            .find(|f| f.is_java_file())
            .or_else(|| self.files.iter().find(|f| f.is_template_file()))
            .or_else(|| self.files.first())
    }
}

/// Walks `relative_path` below `container`, matching every segment ignoring case.
///
/// Returns the file only if the final segment names a regular file; any
/// intermediate segment must be a directory.
pub fn find_file_case_insensitive(container: &Path, relative_path: &str) -> Option<PathBuf> {
    let parts: Vec<&str> = relative_path
        .trim_start_matches('/')
        .split('/')
        .filter(|part| !part.is_empty())
        .collect();

    let mut current = container.to_path_buf();
    for (i, part) in parts.iter().enumerate() {
        let wanted = part.to_lowercase();
        let candidates: Vec<PathBuf> = fs::read_dir(&current)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .collect();
        // an exact-case entry wins over ones differing only by case
        let member = match candidates.iter().position(|path| path.file_name() == Some(OsStr::new(part))) {
            Some(exact) => candidates[exact].clone(),
            None => candidates.into_iter().min()?,
        };

        if i == parts.len() - 1 && member.is_file() {
            trace!("Found {:?} for {}", member, relative_path);
            return Some(member);
        }
        if !member.is_dir() {
            return None;
        }
        current = member;
    }
    None
}
