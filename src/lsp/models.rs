use ropey::Rope;

use serde::Deserialize;

use tower_lsp::lsp_types::Url;

/// State for an open text document managed by the LSP server.
#[derive(Debug)]
pub struct LspDocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

/// LSP document with state for open files.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}

/// Options accepted through `initializationOptions`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Root package of the Tapestry application, overriding the one declared in web.xml.
    pub app_package: Option<String>,
}

impl ServerConfig {
    /// Parses initialization options, falling back to defaults when absent or malformed.
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed initializationOptions: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
