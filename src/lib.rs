pub mod cli;
pub mod client;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use anyhow::Result;
use tracing::debug;

pub enum AppCommand {
    Serve,
    Fetch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => crate::core::config::AppConfig::load_from_path(path)?,
        None => crate::core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve => server::serve(&config).await,
        AppCommand::Fetch => {
            client::run(&config.client).await?;
            Ok(())
        }
    }
}
