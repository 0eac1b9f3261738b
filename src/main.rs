use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docseg::embedder::Batcher;
use docseg::{
    process_batch, process_document, DocumentChunker, FixedSizeConfig, HfTokenizer,
    HierarchicalConfig, HttpEmbedder, RecursiveConfig, SemanticConfig, StrategyConfig,
    TokenizerAdapter, WordTokenizer,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "docseg")]
#[command(about = "Split parsed documents into token-bounded chunks with page geometry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    strategy: Option<Strategy>,

    /// Parsed document (JSON) or a directory of them
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Root directory for chunk files
    #[arg(short, long, global = true, default_value = "chunks")]
    output: PathBuf,

    /// HuggingFace tokenizer.json; a word tokenizer is used without it
    #[arg(long, global = true)]
    tokenizer: Option<PathBuf>,

    /// Embedding server, required by the semantic strategy
    #[arg(long, global = true)]
    embedder_url: Option<String>,

    /// Sentences per embedding request
    #[arg(long, global = true, default_value_t = 32)]
    embed_batch_size: usize,

    /// Strategy config as JSON, instead of a strategy subcommand
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip bounding box reconstruction
    #[arg(long, global = true)]
    no_geom: bool,
}

#[derive(Subcommand)]
enum Strategy {
    /// Fixed windows of tokens with overlap
    FixedSize {
        #[command(flatten)]
        budget: Budget,
        #[arg(short = 'O', long, default_value_t = 32)]
        overlap: usize,
    },
    /// Splits at the coarsest delimiter that keeps chunks in budget
    Recursive {
        #[command(flatten)]
        budget: Budget,
        #[arg(short = 'O', long, default_value_t = 0)]
        overlap: usize,
    },
    /// Breaks where neighbouring sentences drift apart
    Semantic {
        #[command(flatten)]
        budget: Budget,
        /// Distance percentile used as the breakpoint threshold
        #[arg(short = 'Q', long, default_value_t = 95)]
        percentile: u32,
        #[arg(short = 'M', long, default_value_t = 0)]
        min_tokens: usize,
    },
    /// Follows the document tree, prefixing chunks with their headers
    Hierarchical {
        #[command(flatten)]
        budget: Budget,
        /// Share of a chunk that headers may take up
        #[arg(long, default_value_t = 0.5)]
        ratio: f64,
    },
}

#[derive(Args)]
struct Budget {
    #[arg(short = 'N', long, default_value_t = docseg::chunker::DEFAULT_MAX_TOKENS)]
    max_tokens: usize,
}

impl Strategy {
    fn into_config(self) -> StrategyConfig {
        match self {
            Strategy::FixedSize { budget, overlap } => StrategyConfig::FixedSize(FixedSizeConfig {
                max_tokens: budget.max_tokens,
                overlap,
            }),
            Strategy::Recursive { budget, overlap } => StrategyConfig::Recursive(RecursiveConfig {
                max_tokens: budget.max_tokens,
                overlap,
            }),
            Strategy::Semantic {
                budget,
                percentile,
                min_tokens,
            } => StrategyConfig::Semantic(SemanticConfig {
                max_tokens: budget.max_tokens,
                similarity_threshold_percentile: percentile,
                min_tokens,
            }),
            Strategy::Hierarchical { budget, ratio } => {
                StrategyConfig::Hierarchical(HierarchicalConfig {
                    max_tokens: budget.max_tokens,
                    max_parent_token_ratio: ratio,
                })
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match (cli.strategy, &cli.config) {
        (Some(strategy), None) => strategy.into_config(),
        (None, Some(path)) => StrategyConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        (Some(_), Some(_)) => bail!("pass either a strategy subcommand or --config, not both"),
        (None, None) => bail!("no strategy given; use a subcommand or --config"),
    };

    let Some(input) = cli.input else {
        bail!("--input is required");
    };

    let tokenizer = match &cli.tokenizer {
        Some(path) => TokenizerAdapter::new(
            HfTokenizer::from_file(path)
                .with_context(|| format!("Failed to load tokenizer: {}", path.display()))?,
        ),
        None => {
            warn!("no --tokenizer given, falling back to word tokens");
            TokenizerAdapter::new(WordTokenizer::new())
        }
    };
    info!(strategy = config.name(), tokenizer = tokenizer.name(), "chunker ready");

    let mut chunker = DocumentChunker::new(config, tokenizer)?.with_geometry(!cli.no_geom);
    if let Some(url) = &cli.embedder_url {
        let embedder =
            HttpEmbedder::new(url.as_str())?.with_batcher(Batcher::new(cli.embed_batch_size));
        chunker = chunker.with_embedder(embedder);
    }
    chunker.validate()?;

    if input.is_dir() {
        let report = process_batch(&chunker, &input, &cli.output)
            .with_context(|| format!("Failed to chunk batch: {}", input.display()))?;

        println!(
            "Chunked {} of {} documents into {}",
            report.written.len(),
            report.total(),
            cli.output.display()
        );
        for (path, error) in &report.failed {
            eprintln!("  failed: {}: {}", path.display(), error);
        }
        if !report.failed.is_empty() {
            std::process::exit(1);
        }
    } else {
        let result = process_document(&chunker, &input, &cli.output)
            .with_context(|| format!("Failed to chunk document: {}", input.display()))?;

        println!(
            "{} chunks written to {}",
            result.chunks.len(),
            result
                .metadata
                .get("chunk_path")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
        );
    }

    Ok(())
}
