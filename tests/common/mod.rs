//! In-process harness for driving the backend through the LanguageServer trait

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use indoc::indoc;
use tempfile::TempDir;
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverParams, InitializeParams, Location,
    Position, TextDocumentContentChangeEvent, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Url, VersionedTextDocumentIdentifier,
};
use tower_lsp::{ClientSocket, LanguageServer, LspService};

use tapestry_language_server::lsp::backend::TapestryBackend;
use tapestry_language_server::project::DiscoveryConfig;

pub const WEB_XML: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <web-app>
        <context-param>
            <param-name>tapestry.app-package</param-name>
            <param-value>com.example.shop</param-value>
        </context-param>
        <filter>
            <filter-name>app</filter-name>
            <filter-class>org.apache.tapestry5.TapestryFilter</filter-class>
        </filter>
    </web-app>
"#};

pub const APP_MODULE: &str = indoc! {r#"
    package com.example.shop.services;

    import org.apache.tapestry5.ioc.annotations.ImportModule;

    @ImportModule(SecurityModule.class)
    public class AppModule
    {
        public static void contributeComponentClassResolver(Configuration<LibraryMapping> configuration)
        {
            configuration.add(new LibraryMapping("widgets", "com.example.widgets"));
        }
    }
"#};

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small Maven-layout Tapestry project:
/// - app package `com.example.shop`, `AppModule` importing a missing `SecurityModule`
/// - component `Layout` (class and template), page `Index` (template in the web root)
/// - library `widgets` with component `DatePicker`
pub fn sample_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/main/webapp/WEB-INF/web.xml", WEB_XML);
    write(root, "src/main/java/com/example/shop/services/AppModule.java", APP_MODULE);
    write(root, "src/main/java/com/example/shop/components/Layout.java", "public class Layout {}\n");
    write(root, "src/main/resources/com/example/shop/components/Layout.tml", "<html><body/></html>\n");
    write(root, "src/main/webapp/Index.tml", "<html t:type=\"layout\"></html>\n");
    write(root, "src/main/java/com/example/widgets/components/DatePicker.java", "public class DatePicker {}\n");
    dir
}

pub struct TestServer {
    service: LspService<TapestryBackend>,
    _socket: ClientSocket,
}

impl TestServer {
    pub async fn start(root: Option<&Path>) -> Self {
        let (service, socket) = LspService::new(|client| TapestryBackend::new(client, DiscoveryConfig::default()));
        #[allow(deprecated)]
        let params = InitializeParams {
            root_uri: root.map(|root| Url::from_file_path(root).unwrap()),
            ..Default::default()
        };
        service.inner().initialize(params).await.unwrap();
        Self { service, _socket: socket }
    }

    pub fn backend(&self) -> &TapestryBackend {
        self.service.inner()
    }

    pub async fn open_document(&self, path: &Path, text: &str) -> Url {
        let uri = Url::from_file_path(path).unwrap();
        self.backend()
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem::new(uri.clone(), "tml".to_string(), 1, text.to_string()),
            })
            .await;
        uri
    }

    pub async fn replace_text(&self, uri: &Url, version: i32, text: &str) {
        self.backend()
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier::new(uri.clone(), version),
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: text.to_string(),
                }],
            })
            .await;
    }

    pub async fn save(&self, path: &Path) {
        self.backend()
            .did_save(DidSaveTextDocumentParams {
                text_document: TextDocumentIdentifier::new(Url::from_file_path(path).unwrap()),
                text: None,
            })
            .await;
    }

    pub async fn definition(&self, uri: &Url, position: Position) -> Option<Vec<Location>> {
        let response = self
            .backend()
            .goto_definition(GotoDefinitionParams {
                text_document_position_params: TextDocumentPositionParams::new(
                    TextDocumentIdentifier::new(uri.clone()),
                    position,
                ),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            })
            .await
            .unwrap();
        match response? {
            GotoDefinitionResponse::Array(locations) => Some(locations),
            GotoDefinitionResponse::Scalar(location) => Some(vec![location]),
            GotoDefinitionResponse::Link(_) => panic!("unexpected location links"),
        }
    }

    pub async fn hover(&self, uri: &Url, position: Position) -> Option<Hover> {
        self.backend()
            .hover(HoverParams {
                text_document_position_params: TextDocumentPositionParams::new(
                    TextDocumentIdentifier::new(uri.clone()),
                    position,
                ),
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap()
    }
}

/// File names of the locations, in order.
pub fn file_names(locations: &[Location]) -> Vec<String> {
    locations
        .iter()
        .map(|location| {
            location
                .uri
                .to_file_path()
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}
