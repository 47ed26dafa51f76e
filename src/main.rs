use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::{error, info};

use tapestry_language_server::logging::init_logger;
use tapestry_language_server::lsp::backend::TapestryBackend;
use tapestry_language_server::project::{DiscoveryConfig, ProjectModel, ProjectOutline};

/// Language server for navigating Tapestry5 templates
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Print the outline (modules and libraries) of the project in DIR and exit
    #[arg(long, value_name = "DIR")]
    outline: Option<PathBuf>,

    /// Root package of the Tapestry application, overriding web.xml
    #[arg(long, value_name = "PKG")]
    app_package: Option<String>,

    /// Log filter for stderr (defaults to RUST_LOG, then "info")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Disable ANSI colors in log output
    #[arg(long)]
    no_color: bool,

    /// Do not write a session log file to the user cache directory
    #[arg(long)]
    no_file_logging: bool,
}

fn print_outline(root: PathBuf, config: &DiscoveryConfig) -> ExitCode {
    match ProjectModel::discover(&root, config) {
        Ok(project) => {
            print!("{}", ProjectOutline::build(&project));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve_stdio(config: DiscoveryConfig) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| TapestryBackend::new(client, config));
    info!("Serving LSP on stdio");
    Server::new(stdin, stdout, socket).serve(service).await;
    info!("LSP session ended");
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Outline mode writes to stdout and is short-lived; no session file needed there.
    let file_logging = !args.no_file_logging && args.outline.is_none();
    let _guard = init_logger(args.no_color, args.log_level.as_deref(), file_logging)?;

    let config = DiscoveryConfig {
        app_package: args.app_package,
    };

    if let Some(root) = args.outline {
        return Ok(print_outline(root, &config));
    }

    serve_stdio(config).await;
    Ok(ExitCode::SUCCESS)
}
