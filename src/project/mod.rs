//! Tapestry project model
//!
//! A [`ProjectModel`] is discovered once from a workspace root and then shared
//! read-only. It knows the application package, the source roots to search,
//! the IoC modules reachable from the application module and the component
//! libraries those modules contribute.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

mod discovery;
pub mod files;
pub mod outline;
mod resolve;

pub use files::{ComponentContext, TapestryFile, TapestryFileKind, find_file_case_insensitive};
pub use outline::{OutlineData, OutlineNode, ProjectOutline};

/// Shown in place of a module whose source is not in the workspace.
pub const SOURCE_NOT_FOUND: &str = "source not found";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project root {0:?} does not exist or is not a directory")]
    RootNotFound(PathBuf),

    #[error("no tapestry.app-package found for {0:?}; declare it in WEB-INF/web.xml or pass it explicitly")]
    AppPackageNotFound(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Inputs to discovery that do not come from the project files themselves.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    pub app_package: Option<String>,
}

/// How a module became part of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleReference {
    /// The application module named after the Tapestry filter in web.xml.
    AppModule { filter_name: String },
    /// Pulled in by an `@ImportModule` or `@SubModule` annotation on another module.
    Imported { annotation: String, by: String },
}

impl ModuleReference {
    pub fn label(&self) -> String {
        match self {
            Self::AppModule { filter_name } => format!("(filter '{}' in web.xml)", filter_name),
            Self::Imported { annotation, by } => format!("(via @{} of {})", annotation, by),
        }
    }
}

/// A Tapestry IoC module class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapestryModule {
    /// Fully qualified class name.
    pub class_name: String,
    /// Source file, when the class is part of the workspace.
    pub path: Option<PathBuf>,
    pub reference: ModuleReference,
}

impl TapestryModule {
    pub fn simple_name(&self) -> &str {
        self.class_name.rsplit('.').next().unwrap_or(&self.class_name)
    }
}

/// A component library contributed to the component class resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryMapping {
    pub prefix: String,
    pub root_package: String,
}

#[derive(Debug, Clone)]
pub struct ProjectModel {
    pub root: PathBuf,
    pub app_package: String,
    /// Roots holding Java sources (`src/main/java`).
    pub java_roots: Vec<PathBuf>,
    /// Roots holding templates and other classpath resources (`src/main/resources`).
    pub resource_roots: Vec<PathBuf>,
    /// Web application root (`src/main/webapp`), where page templates may also live.
    pub web_root: Option<PathBuf>,
    pub modules: Vec<TapestryModule>,
    pub library_mappings: Vec<LibraryMapping>,
}

impl ProjectModel {
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }
}
