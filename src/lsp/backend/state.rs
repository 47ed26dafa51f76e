//! Backend state management
//!
//! This module defines the TapestryBackend struct, which holds the open
//! documents and the discovered project model.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::models::LspDocument;
use crate::project::{DiscoveryConfig, ProjectModel};

/// The Tapestry language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct TapestryBackend {
    pub(super) client: Client,
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    /// Discovery inputs from the command line, refined by initializationOptions
    pub(super) config: Arc<RwLock<DiscoveryConfig>>,
    pub(super) root_dir: Arc<RwLock<Option<PathBuf>>>,
    /// Swapped whole on rediscovery; readers keep the snapshot they cloned
    pub(super) project: Arc<RwLock<Option<Arc<ProjectModel>>>>,
}

// Manual Debug implementation since Client doesn't carry useful state
impl std::fmt::Debug for TapestryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapestryBackend")
            .field("documents_count", &self.documents_by_uri.len())
            .finish()
    }
}
