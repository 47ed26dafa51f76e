pub mod logging;
pub mod lsp;
pub mod project;
pub mod scanner;
