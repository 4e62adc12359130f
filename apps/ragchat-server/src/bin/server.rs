use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ragchat_core::config::AppConfig;
use ragchat_engine::LoadOutcome;
use ragchat_server::{build_engine, ingest, router, AppState};

#[derive(Parser)]
#[command(name = "ragchat-server", about = "Retrieval-augmented chat over a text corpus")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the corpus if needed, then serve `POST /chat`
    Serve,
    /// Ingest the corpus if needed and exit
    Ingest,
    /// Answer one question and print its sources
    Ask {
        question: String,
        #[arg(long)]
        k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Ingest => {
            match ingest(&config).await? {
                LoadOutcome::Skipped { count } => {
                    println!("Index already complete: {count} chunks")
                }
                LoadOutcome::Ingested { count } => println!("Ingested {count} chunks"),
                LoadOutcome::Rebuilt { count } => {
                    println!("Rebuilt partial index: {count} chunks")
                }
            }
            Ok(())
        }
        Command::Ask { question, k } => {
            let engine = build_engine(&config).await?;
            let k = k.unwrap_or(config.retrieval.k);
            let response = engine.answer(&question, &[], k).await?;
            println!("{}\n", response.answer);
            for (rank, source) in response.sources.iter().enumerate() {
                println!("[{}] {}", rank + 1, source);
            }
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let engine = build_engine(&config).await?;
    let state = AppState {
        engine: Arc::new(engine),
        k: config.retrieval.k,
    };
    let app = router(state, config.server.cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Serving POST /chat on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
