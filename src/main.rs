use std::process::ExitCode;

use log::error;
use showcase_api::{routes, HttpServer, ServerConfig, ServerError};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    let server = HttpServer::new(config, routes::router()?);
    server.start().await
}
