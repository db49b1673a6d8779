use clap::Parser;
use corpus_digest::pipeline::{PipelineApi, PipelineService};
use corpus_digest::{api, config, logging};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Summarization and question answering server for folders of documents.
#[derive(Parser)]
#[command(name = "corpus-digest", version)]
struct Cli {
    /// Run a single corpus pass, print the summaries to stdout, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();
    let service = Arc::new(PipelineService::from_config());

    if cli.once {
        run_once(service).await;
        return;
    }

    let app = api::create_router(service);
    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn run_once(service: Arc<PipelineService>) {
    let outcome = service.run_pass().await.expect("Corpus pass failed");
    let snapshot = service.snapshot();

    for summary in snapshot.file_summaries.values() {
        println!("--- Summary for {} ---", summary.document_name);
        println!("{}\n", summary.summary_text);
    }

    tracing::info!(
        total_files = outcome.total_files,
        documents_summarized = outcome.documents_summarized,
        documents_skipped = outcome.documents_skipped,
        "Single pass finished"
    );
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4200..=4299;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4200-4299",
    ))
}
