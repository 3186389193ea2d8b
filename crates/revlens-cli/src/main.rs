mod display;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use revlens_ai::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_HF_BASE_URL, DEFAULT_SENTIMENT_MODEL,
    GEMINI_KEY_VARS, GeminiConfig, GeminiExtractor, HfConfig, HfSentimentClassifier,
};
use revlens_core::{
    KeyPointExtractor, PageRequest, ReviewOrchestrator, ReviewStore, SentimentClassifier,
    StageSchedule, fetch_page,
};
use revlens_store::MemoryStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "revlens", version, about = "Product review analysis: sentiment, key points, storage")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "REVLENS_BIND", default_value = "127.0.0.1:6543")]
        bind: SocketAddr,

        #[command(flatten)]
        ai: AiArgs,
    },
    /// Analyse one review and store the result.
    Analyze {
        /// Review text, in any language the models support.
        text: String,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        ai: AiArgs,
    },
    /// List stored reviews, newest first.
    Reviews {
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i64,

        /// Print the page as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// DuckDB database file.
    #[arg(long, env = "REVLENS_DATABASE", default_value = "revlens.duckdb", global = true)]
    database: PathBuf,

    /// Keep reviews in memory only.
    #[arg(long, global = true)]
    in_memory: bool,
}

#[derive(Args, Debug)]
struct AiArgs {
    #[arg(long, env = "HUGGINGFACE_ACCESS_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    #[arg(long, env = "REVLENS_SENTIMENT_MODEL", default_value = DEFAULT_SENTIMENT_MODEL)]
    sentiment_model: String,

    #[arg(long, env = "REVLENS_HF_URL", default_value = DEFAULT_HF_BASE_URL)]
    hf_url: String,

    /// Directory with model.onnx, tokenizer.json and config.json; replaces the hosted classifier.
    #[cfg(feature = "onnx")]
    #[arg(long, env = "REVLENS_ONNX_MODEL_DIR")]
    onnx_model_dir: Option<PathBuf>,

    #[arg(long, env = "REVLENS_GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    #[arg(long, env = "REVLENS_GEMINI_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    gemini_url: String,

    /// Per-request timeout for model services, in seconds.
    #[arg(long, env = "REVLENS_AI_TIMEOUT_SECS", default_value_t = 30)]
    ai_timeout_secs: u64,

    /// Classify before extracting instead of running both at once.
    ///
    /// Accepts true/false, yes/no, on/off or 1/0; a bare flag means true.
    #[arg(
        long,
        env = "REVLENS_SEQUENTIAL_STAGES",
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true"
    )]
    sequential: bool,
}

impl AiArgs {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    fn schedule(&self) -> StageSchedule {
        if self.sequential {
            StageSchedule::Sequential
        } else {
            StageSchedule::Concurrent
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    info!("revlens v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&cli.store)?;

    match cli.command {
        Command::Serve { bind, ai } => {
            let orchestrator = build_orchestrator(&ai, store)?;
            revlens_server::serve(bind, Arc::new(orchestrator)).await?;
        }
        Command::Analyze { text, json, ai } => {
            let orchestrator = build_orchestrator(&ai, store)?;
            let record = orchestrator.analyze_review(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print!("{}", display::render_card(&record));
            }
        }
        Command::Reviews { page, limit, json } => {
            let page = fetch_page(store.as_ref(), PageRequest::normalize(page, limit)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print!("{}", display::render_page(&page));
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Wiring ──

fn open_store(args: &StoreArgs) -> anyhow::Result<Arc<dyn ReviewStore>> {
    if args.in_memory {
        info!("using in-memory review store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    open_durable_store(&args.database)
}

#[cfg(feature = "duckdb")]
fn open_durable_store(path: &Path) -> anyhow::Result<Arc<dyn ReviewStore>> {
    let store = revlens_store::DuckStore::open_persistent(path)
        .with_context(|| format!("opening review database {}", path.display()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "duckdb"))]
fn open_durable_store(path: &Path) -> anyhow::Result<Arc<dyn ReviewStore>> {
    warn!(path = %path.display(), "built without DuckDB, reviews are kept in memory");
    Ok(Arc::new(MemoryStore::new()))
}

fn build_orchestrator(
    ai: &AiArgs,
    store: Arc<dyn ReviewStore>,
) -> anyhow::Result<ReviewOrchestrator> {
    let classifier = build_classifier(ai)?;
    let extractor = build_extractor(ai)?;
    let schedule = ai.schedule();
    info!(?schedule, "analysis pipeline ready");
    Ok(ReviewOrchestrator::new(classifier, extractor, store).with_schedule(schedule))
}

fn build_classifier(ai: &AiArgs) -> anyhow::Result<Arc<dyn SentimentClassifier>> {
    #[cfg(feature = "onnx")]
    {
        if let Some(dir) = &ai.onnx_model_dir {
            let classifier = revlens_ai::OnnxSentimentClassifier::load(dir)
                .with_context(|| format!("loading sentiment model from {}", dir.display()))?;
            return Ok(Arc::new(classifier));
        }
    }

    if ai.hf_token.is_none() {
        warn!("HUGGINGFACE_ACCESS_TOKEN not set, hosted classifier calls are unauthenticated");
    }
    let classifier = HfSentimentClassifier::new(HfConfig {
        base_url: ai.hf_url.clone(),
        model: ai.sentiment_model.clone(),
        token: ai.hf_token.clone(),
        timeout: ai.timeout(),
    })
    .context("building sentiment classifier")?;
    Ok(Arc::new(classifier))
}

fn build_extractor(ai: &AiArgs) -> anyhow::Result<Arc<dyn KeyPointExtractor>> {
    let api_key = GeminiConfig::api_key_from_env().with_context(|| {
        format!("Gemini API key not found, set one of {}", GEMINI_KEY_VARS.join(", "))
    })?;
    let extractor = GeminiExtractor::new(GeminiConfig {
        api_key,
        model: ai.gemini_model.clone(),
        base_url: ai.gemini_url.clone(),
        timeout: ai.timeout(),
    })
    .context("building key point extractor")?;
    Ok(Arc::new(extractor))
}
