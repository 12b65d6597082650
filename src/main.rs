// src/main.rs

use dotenvy::dotenv;
use omr_backend::config::Config;
use omr_backend::omr::{CommandOmr, OmrEngine};
use omr_backend::routes;
use omr_backend::state::AppState;
use omr_backend::store::ExamStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize the exam store and its root directory
    let store = ExamStore::new(&config.exams_root);
    store
        .ensure_root()
        .await
        .expect("Failed to create the exams root directory");
    tracing::info!("Exam store rooted at {}", store.root().display());

    // Wire the external OMR engine
    let omr: Arc<dyn OmrEngine> = Arc::new(CommandOmr::new(&config.omr_command));

    // Create AppState
    let state = AppState { store, omr, config };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
