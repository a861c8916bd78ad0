use clap::Parser;
use clap::Subcommand;
use mathrag::api::build_agent;
use mathrag::api::serve_api;
use mathrag::config::AppConfig;
use mathrag::kb::load_problems;
use mathrag::kb::KnowledgeBase;
use mathrag::kb::KnowledgeSearch;
use mathrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "mathrag")]
#[command(about = "MathRAG CLI for the math tutoring pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Enable CORS for browser clients
        #[arg(long)]
        cors: bool,
    },
    /// Build the knowledge base from the configured dataset
    Ingest {
        /// Maximum number of records to ingest
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Query the knowledge base without solving
    Query {
        /// The question to search for
        question: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },
    /// Solve a question end to end and print the solution
    Solve {
        /// The question to solve
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        mathrag::logging::init_logging_with_level("debug")?;
    } else {
        mathrag::logging::init_logging()?;
    }

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = cors || config.server.enable_cors;
            serve_api(&config, host, port, enable_cors).await?;
        }
        Commands::Ingest { limit } => {
            handle_ingest(&config, limit)?;
        }
        Commands::Query { question, limit } => {
            handle_query(&config, &question, limit)?;
        }
        Commands::Solve { question } => {
            handle_solve(&config, &question).await?;
        }
    }

    Ok(())
}

fn build_kb(config: &AppConfig, limit: usize) -> Result<KnowledgeBase> {
    let kb = KnowledgeBase::new(
        config.knowledge_base.max_features,
        Some(config.vectorizer_path().into()),
    );
    let records = load_problems(config.dataset_path(), limit)?;
    let count = kb.ingest(records)?;
    println!("Ingested {count} problems from {}", config.dataset_path());
    Ok(kb)
}

fn handle_ingest(config: &AppConfig, limit: Option<usize>) -> Result<()> {
    build_kb(config, limit.unwrap_or(config.knowledge_base.ingest_limit))?;
    Ok(())
}

fn handle_query(config: &AppConfig, question: &str, limit: usize) -> Result<()> {
    let kb = build_kb(config, config.knowledge_base.ingest_limit)?;
    let results = kb.search(question, limit)?;

    if results.is_empty() {
        println!("No matches found");
        return Ok(());
    }

    println!("Top {} matches:", results.len());
    for result in results {
        if let Some(record) = result.record() {
            println!("  [{:.3}] {} ({})", result.score, record.question, record.topic);
        }
    }
    Ok(())
}

async fn handle_solve(config: &AppConfig, question: &str) -> Result<()> {
    let agent = build_agent(config)?;
    let solution = agent.solve(question).await;

    println!("Question: {}", solution.question);
    println!(
        "Route: {} | Method: {} | Confidence: {:.2}",
        solution.route, solution.method, solution.confidence
    );
    for step in &solution.steps {
        println!("  Step {}: {}", step.step_number, step.text);
    }
    println!("Final answer: {}", solution.final_answer);
    println!("Solved in {}ms", solution.processing_time_ms);
    Ok(())
}
