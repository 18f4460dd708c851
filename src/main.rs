use anyhow::Result;
use clap::Parser;

use keyaudit::{cli, logging};

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    match cli.execute() {
        Ok(()) => {
            logging::log_session_end();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Application error: {}", e);

            // Log error chain if available
            let mut source = e.source();
            while let Some(err) = source {
                tracing::error!("   Caused by: {}", err);
                source = err.source();
            }

            logging::log_session_end();
            Err(e)
        }
    }
}
