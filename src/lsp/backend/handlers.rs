//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for the
//! Tapestry backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_save, did_close)
//! - Navigation (goto_definition) and hover on component references

use std::sync::Arc;

use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, GotoDefinitionParams,
    GotoDefinitionResponse, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MessageType, OneOf, PositionEncodingKind,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions,
};
use tracing::{debug, info, warn};

use super::state::TapestryBackend;
use super::{hover_markup, locations_for};
use crate::lsp::models::{LspDocument, ServerConfig};

#[tower_lsp::async_trait]
impl LanguageServer for TapestryBackend {
    /// Handles the LSP initialize request, recording the workspace root and discovering the project.
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        let options = ServerConfig::from_initialization_options(params.initialization_options);
        if let Some(app_package) = options.app_package {
            info!("Using app package {} from initializationOptions", app_package);
            self.config.write().await.app_package = Some(app_package);
        }

        #[allow(deprecated)]
        let root_uri = params
            .root_uri
            .or_else(|| params.workspace_folders.and_then(|folders| folders.into_iter().next().map(|f| f.uri)));
        match root_uri.map(|uri| (uri.to_file_path(), uri)) {
            Some((Ok(root_path), _)) => {
                self.set_root(root_path).await;
                self.reload_project().await;
            }
            Some((Err(()), uri)) => {
                warn!("Failed to convert root_uri to path: {}. Skipping project discovery.", uri);
            }
            None => debug!("Client sent no workspace root"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                position_encoding: Some(PositionEncodingKind::UTF16),
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                    ..Default::default()
                })),
                definition_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification.
    async fn initialized(&self, _: InitializedParams) {
        let status = match self.project().await {
            Some(project) => format!("Tapestry project {} ({})", project.name(), project.app_package),
            None => "No Tapestry project found; component navigation is disabled".to_string(),
        };
        info!("Initialized: {}", status);
        self.client.log_message(MessageType::INFO, status).await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> LspResult<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        info!("Opening document: URI={}, version={}", item.uri, item.version);

        let document = Arc::new(LspDocument::new(self.next_document_id(), item.uri.clone(), &item.text, item.version));
        self.documents_by_uri.insert(item.uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let Some(document) = self.documents_by_uri.get(&uri).map(|entry| Arc::clone(entry.value())) else {
            warn!("Change for unopened document {}", uri);
            return;
        };
        if document.apply(params.content_changes, version).await.is_some() {
            debug!("Updated document: {}, id: {}, version: {}", uri, document.id, version);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if Self::affects_project(&params.text_document.uri) {
            info!("Rediscovering project after save of {}", params.text_document.uri);
            self.reload_project().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents_by_uri.remove(&uri) {
            Some((_, document)) => info!("Closed document: {}, id: {}", uri, document.id),
            None => warn!("Closed document not found: {}", uri),
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        if params.changes.iter().any(|change| Self::affects_project(&change.uri)) {
            info!("Rediscovering project after {} watched file changes", params.changes.len());
            self.reload_project().await;
        }
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> LspResult<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("goto_definition request for {} at {:?}", uri, position);

        let Some(reference) = self.resolve_reference_at(&uri, position).await else {
            return Ok(None);
        };
        let locations = locations_for(&reference.context);
        info!(
            "goto_definition: '{}' resolved to {} files",
            reference.found.name,
            locations.len()
        );
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("hover request for {} at {:?}", uri, position);

        Ok(self.resolve_reference_at(&uri, position).await.map(|reference| Hover {
            contents: HoverContents::Markup(hover_markup(&reference.context)),
            range: Some(reference.range),
        }))
    }
}
