use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use paste_server::config::{generate_config_template, Cli, Config};
use paste_server::paste::{CodecKey, PasteCodec, PasteStore};
use paste_server::error::startup_report;
use paste_server::{db, routes, state};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialised yet, so report on stderr directly
            eprintln!("Error: {}", startup_report(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Handle --generate-config: print template and exit
    if cli.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Handle --generate-key: print a fresh encryption key and exit
    if cli.generate_key {
        println!("{}", CodecKey::generate().encoded());
        return Ok(());
    }

    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load(&cli)?;

    init_tracing(config.json_logs);

    tracing::info!("Paste server v{} starting", env!("CARGO_PKG_VERSION"));

    // Fixed for the lifetime of the process; there is no rotation path
    let (key, _source) = CodecKey::load(config.encrypt_key.as_deref())?;
    let codec = Arc::new(PasteCodec::new(&key));

    let db = db::init_db(
        &config.data_dir,
        &config.database_file,
        Duration::from_millis(config.busy_timeout_ms),
    )?;

    let app_state = state::AppState {
        store: Arc::new(PasteStore::new(db, codec)),
        max_paste_bytes: config.max_paste_bytes,
    };

    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("paste_server=info"));

    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
