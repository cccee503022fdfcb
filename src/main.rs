use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docqa_core::{DocumentIndexer, InitOutcome};
use docqa_gemini::GeminiClient;
use docqa_rag::{IndexBuilder, LocalRAGEngine, RagConfig};
use docqa_web::{AnswerGenerator, ServerConfig, build_router, serve};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(version, about = "Ask questions about a directory of documents", long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory containing the source documents
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Directory holding the persisted vector index
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Rebuild the index even if one already exists
    #[arg(long)]
    rebuild: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "docqa=debug,docqa_rag=debug,docqa_web=debug,docqa_gemini=debug,tower_http=debug"
    } else {
        "docqa=info,docqa_rag=info,docqa_web=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut rag_config = RagConfig::from_env()?;
    if let Some(docs_dir) = cli.docs_dir {
        rag_config.docs_dir = docs_dir;
    }
    if let Some(index_dir) = cli.index_dir {
        rag_config.index_dir = index_dir;
    }

    let mut server_config = ServerConfig::from_env()?;
    if let Some(host) = cli.host {
        server_config.host = host;
    }
    if let Some(port) = cli.port {
        server_config.port = port;
    }
    tracing::debug!(?rag_config, ?server_config, "Loaded configuration");

    let gemini = Arc::new(GeminiClient::from_env()?);

    // The index must exist before the listener binds
    let indexer = IndexBuilder::new(gemini.clone(), &rag_config);
    if cli.rebuild {
        let result = indexer.rebuild().await?;
        report_build(result.documents_indexed, result.chunks_indexed, &result.errors);
    } else {
        match indexer.initialize().await? {
            InitOutcome::Built(result) => {
                report_build(result.documents_indexed, result.chunks_indexed, &result.errors)
            }
            InitOutcome::AlreadyPresent { stale: true } => println!(
                "{} {}",
                "⚠️  Vector index is out of date with".yellow(),
                rag_config.docs_dir.display().to_string().yellow()
            ),
            InitOutcome::AlreadyPresent { stale: false } => {}
        }
    }

    let rag = Arc::new(LocalRAGEngine::new(gemini.clone(), &rag_config));
    let generator = AnswerGenerator::new(gemini, rag);
    let router = build_router(generator);

    display_banner(&server_config, &rag_config);
    serve(&server_config, router).await?;

    Ok(())
}

fn report_build(documents: usize, chunks: usize, errors: &[String]) {
    println!(
        "{}",
        format!("✅ Indexed {} documents into {} chunks", documents, chunks).green()
    );
    for error in errors {
        println!("{} {}", "   skipped:".yellow(), error);
    }
}

fn display_banner(server: &ServerConfig, rag: &RagConfig) {
    println!();
    println!("{}", "📚 DocQA".bright_cyan().bold());
    println!("{} {}", "   Documents:".dimmed(), rag.docs_dir.display());
    println!("{} {}", "   Index:    ".dimmed(), rag.index_dir.display());
    println!(
        "{} {}",
        "   Chat at:  ".dimmed(),
        format!("http://{}", server.address()).bright_green().underline()
    );
    println!();
}
