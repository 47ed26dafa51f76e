use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Location, MarkupContent, MarkupKind, Position, Range, Url};
use tracing::{debug, info, warn};

use crate::lsp::document::{char_to_position, position_to_char};
use crate::project::{ComponentContext, DiscoveryConfig, ProjectModel};
use crate::scanner::{ComponentNameMatch, find_component_name_at};

mod handlers;
mod state;

pub use state::TapestryBackend;

/// A component reference found under the cursor together with what it resolves to.
#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub found: ComponentNameMatch,
    pub context: ComponentContext,
    /// LSP range of the reference in the requesting document.
    pub range: Range,
}

impl TapestryBackend {
    /// Creates a new backend. `config` holds command-line discovery options;
    /// initializationOptions sent by the client take precedence.
    pub fn new(client: Client, config: DiscoveryConfig) -> Self {
        Self {
            client,
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            config: Arc::new(RwLock::new(config)),
            root_dir: Arc::new(RwLock::new(None)),
            project: Arc::new(RwLock::new(None)),
        }
    }

    pub(super) fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the current project snapshot, if one was discovered.
    pub async fn project(&self) -> Option<Arc<ProjectModel>> {
        self.project.read().await.clone()
    }

    /// Discovers the project under the recorded root and installs it.
    ///
    /// Discovery walks the file system, so it runs on the blocking pool. On
    /// failure the previous project, if any, is dropped.
    pub async fn reload_project(&self) {
        let Some(root) = self.root_dir.read().await.clone() else {
            debug!("No workspace root, skipping project discovery");
            return;
        };
        let config = self.config.read().await.clone();

        let discovered = tokio::task::spawn_blocking(move || ProjectModel::discover(&root, &config)).await;
        let project = match discovered {
            Ok(Ok(project)) => Some(Arc::new(project)),
            Ok(Err(e)) => {
                warn!("Project discovery failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Project discovery task failed: {}", e);
                None
            }
        };
        *self.project.write().await = project;
    }

    /// Finds and resolves the component reference at `position` in an open document.
    pub async fn resolve_reference_at(&self, uri: &Url, position: Position) -> Option<ResolvedReference> {
        let Some(document) = self.documents_by_uri.get(uri).map(|entry| Arc::clone(entry.value())) else {
            debug!("Document not open: {}", uri);
            return None;
        };
        let text: Rope = document.rope().await;

        let offset = position_to_char(&text, position)?;
        let found = find_component_name_at(&text, offset)?;
        debug!("Component reference '{}' at {:?} in {}", found.name, found.region, uri);

        let Some(project) = self.project().await else {
            debug!("No Tapestry project, cannot resolve '{}'", found.name);
            return None;
        };
        let Some(context) = project.resolve_component(&found.name) else {
            debug!("No files found for component '{}'", found.name);
            return None;
        };

        let range = Range::new(
            char_to_position(&text, found.region.offset),
            char_to_position(&text, found.region.end()),
        );
        Some(ResolvedReference { found, context, range })
    }

    /// True for files whose change can alter the project model.
    pub(super) fn affects_project(uri: &Url) -> bool {
        let path = uri.path();
        path.ends_with(".java") || path.ends_with("/web.xml")
    }

    pub(super) async fn set_root(&self, root: PathBuf) {
        info!("Workspace root: {:?}", root);
        *self.root_dir.write().await = Some(root);
    }
}

/// One location per component file, pointing at the start of the file.
pub fn locations_for(context: &ComponentContext) -> Vec<Location> {
    context
        .files
        .iter()
        .filter_map(|file| file_location(&file.path))
        .collect()
}

fn file_location(path: &Path) -> Option<Location> {
    match Url::from_file_path(path) {
        Ok(uri) => Some(Location::new(uri, Range::default())),
        Err(()) => {
            warn!("Cannot express {:?} as a file URI", path);
            None
        }
    }
}

/// Markdown hover text naming the component and its files.
pub fn hover_markup(context: &ComponentContext) -> MarkupContent {
    let mut value = format!("**{}**\n", context.name);
    for file in &context.files {
        value.push_str(&format!("\n- `{}`", file.name()));
    }
    MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    }
}
