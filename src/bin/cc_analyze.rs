//! CLI entry point for locally exercising the pipeline against a PDF file.
//! Convenience tooling for development, not a collaborator boundary: the
//! job store, HTTP surface, and scheduling remain out of scope of the core.

use clap::Parser;
use colored::Colorize;
use contract_compliance::config::Settings;
use contract_compliance::inference::LanguageModel;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "cc-analyze", about = "Analyze a contract PDF against the compliance catalog")]
struct Args {
    /// Path to the contract PDF.
    pdf_path: PathBuf,

    /// Base URL of an OpenAI-compatible chat completion endpoint.
    #[arg(long, env = "CC_LLM_BASE_URL", default_value = "https://api.openai.com/v1")]
    llm_base_url: String,

    /// API key for the LLM endpoint.
    #[arg(long, env = "CC_LLM_API_KEY", default_value = "")]
    llm_api_key: String,

    /// Model identifier.
    #[arg(long, env = "CC_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Show debug progress output.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let handler: std::sync::Arc<dyn contract_compliance::logging::ProgressHandler> = if args.verbose {
        std::sync::Arc::new(contract_compliance::logging::ConsoleProgressHandler::verbose())
    } else {
        std::sync::Arc::new(contract_compliance::logging::ConsoleProgressHandler::new())
    };
    contract_compliance::logging::init_progress_handler(handler);

    let settings = Settings::load()?;
    let core_config = settings.to_core_config();

    let pdf_bytes = std::fs::read(&args.pdf_path)?;
    let filename = args
        .pdf_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("contract.pdf")
        .to_string();

    let model: Box<dyn LanguageModel> = Box::new(contract_compliance::inference::http::OpenAiCompatibleModel::new(
        args.llm_base_url,
        args.llm_api_key,
        args.llm_model,
    ));

    let cancel = CancellationToken::new();

    let spinner = (!args.verbose && console::Term::stdout().features().is_attended()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
        pb.set_message("analyzing contract against the compliance catalog...");
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let run = contract_compliance::run_analysis(&pdf_bytes, &filename, model.as_ref(), core_config, &cancel).await?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    println!(
        "{}",
        format!(
            "Parsed {} pages ({} chunks, needs_ocr={})",
            run.document.page_count(),
            run.chunks.len(),
            run.document.needs_ocr()
        )
        .bold()
    );

    for result in &run.results {
        println!();
        println!("{}", result.compliance_question.bold());
        println!(
            "  state: {:?}  confidence: {}",
            result.compliance_state, result.confidence
        );
        println!("  rationale: {}", result.rationale);
        for quote in &result.relevant_quotes {
            println!(
                "  quote (p.{}-{}): \"{}\"",
                quote.page_start, quote.page_end, quote.text
            );
        }
    }

    Ok(())
}
