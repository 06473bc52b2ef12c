use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::lsp::backend::Backend;
use crate::Config;

/// Start the LSP server
pub async fn serve() -> Result<()> {
    let config = Config::from_args_and_env()?;

    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    log::info!(
        "Starting standard-language-server with engine '{}'",
        config.engine_module
    );

    let (service, socket) =
        LspService::build(move |client| Backend::new(client, config)).finish();

    Server::new(stdin(), stdout(), socket).serve(service).await;

    log::info!("standard-language-server stopped");

    Ok(())
}
