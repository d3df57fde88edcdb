//! pdfbridge server
//!
//! A thin HTTP gateway around two adapters: lopdf-based PDF assembly
//! (merge, recompress, images-to-PDF) and a headless LibreOffice process
//! for office-format conversions. Uploads are staged to a scratch
//! directory and removed again on every exit path.

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod convert;
mod error;
mod ops;
mod staging;

use convert::Converter;
use staging::Staging;

/// Command-line arguments for the pdfbridge server
#[derive(Parser, Debug)]
#[command(name = "pdfbridge-server")]
#[command(about = "HTTP gateway for PDF assembly and office-document conversion")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory for staged uploads
    #[arg(long, default_value = "uploads")]
    upload_dir: String,

    /// Conversion engine binary
    #[arg(long, default_value = "soffice")]
    soffice_path: String,

    /// Conversion timeout in milliseconds
    #[arg(long, default_value = "60000")]
    convert_timeout_ms: u64,

    /// Per-file upload size cap in megabytes
    #[arg(long, default_value = "50")]
    max_file_size_mb: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub staging: Staging,
    pub converter: Converter,
    /// Per-file upload size cap in bytes
    pub max_file_size: u64,
}

/// Build the router: one health route plus the table-driven conversion
/// surface. The staging directory is deliberately not served.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Body cap: every upload slot at the per-file limit, plus multipart
    // framing overhead.
    let body_limit =
        state.max_file_size as usize * ops::MAX_UPLOADS + 1024 * 1024;

    Router::new()
        .route("/health", get(api::handle_health))
        .route("/api/pdf/:op", post(api::handle_operation))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let staging = Staging::new(&args.upload_dir).await?;
    let converter = Converter::new(
        args.soffice_path.as_str(),
        staging.dir(),
        args.convert_timeout_ms,
    );

    let state = AppState {
        staging,
        converter,
        max_file_size: args.max_file_size_mb * 1024 * 1024,
    };

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("pdfbridge server listening on http://{}", addr);
    info!("Upload dir: {}", args.upload_dir);
    info!("Conversion timeout: {}ms", args.convert_timeout_ms);
    info!("Per-file size cap: {} MB", args.max_file_size_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
