use clap::Parser;
use pisync::config::{Args, DeployConfig};
use pisync::engine::DeployEngine;
use pisync::server::{self, AppState};
use pisync::transport::SshConnector;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Credentials usually live in .env next to the project
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs share stderr with the progress bar; stdout stays empty
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    let config = DeployConfig::from_args(&args);

    if args.serve {
        let state = AppState::new(config, Arc::new(SshConnector));
        let runtime = tokio::runtime::Runtime::new()?;
        if let Err(e) = runtime.block_on(server::serve(args.bind, state)) {
            error!("Server error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let engine = DeployEngine::new(&config, &SshConnector);
    if let Err(e) = engine.run() {
        error!("Sync failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
