//! PDF Summarizer - Entry point
//!
//! `summarize <file>` runs the pipeline once and prints the result;
//! `serve` (the default) exposes it as an MCP server on stdio.

use clap::{Args, Parser, Subcommand};
use pdf_summarizer::{
    run_server, source::resolve_path, Error, Extractor, OpenAiClient, PdfiumBackend,
    PromptSource, ServerConfig, Summarizer, SummarizerConfig, TesseractCli,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// File holding the system prompt
    #[arg(long, global = true, default_value = pdf_summarizer::config::DEFAULT_PROMPT_PATH)]
    prompt_file: PathBuf,

    /// Chat model identifier
    #[arg(long, global = true, default_value = "gpt-4o-mini")]
    model: String,

    /// Sampling temperature
    #[arg(long, global = true, default_value_t = 0.8)]
    temperature: f32,

    /// Maximum tokens to generate
    #[arg(long, global = true, default_value_t = 4096)]
    max_tokens: u32,

    /// Tesseract language(s), e.g. "eng" or "eng+fra"
    #[arg(long, global = true, default_value = "eng")]
    ocr_lang: String,

    /// Tesseract executable
    #[arg(long, global = true, default_value = "tesseract")]
    tesseract: String,

    /// Password for encrypted PDFs
    #[arg(long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a single PDF and print the result
    Summarize {
        /// PDF file to summarize
        file: PathBuf,

        /// Print only the model response, not the extracted text
        #[arg(long)]
        response_only: bool,
    },
    /// Serve the pipeline as MCP tools over stdio
    Serve {
        /// Restrict path sources to these directories
        #[arg(long = "resource-dir")]
        resource_dirs: Vec<String>,

        /// Allow URL sources that resolve to private addresses
        #[arg(long)]
        allow_private_urls: bool,
    },
}

fn build_summarizer(args: &PipelineArgs) -> anyhow::Result<Summarizer> {
    let config = SummarizerConfig {
        model: args.model.clone(),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        prompt: PromptSource::File(args.prompt_file.clone()),
        ..SummarizerConfig::default()
    };

    let chat = OpenAiClient::from_env(config.request_timeout)?;

    if !PdfiumBackend::is_available() {
        tracing::warn!("PDFium library not found; PDFs cannot be read");
    }
    let mut backend = PdfiumBackend::new();
    if let Some(password) = &args.password {
        backend = backend.with_password(password.clone());
    }
    let ocr = TesseractCli::new()
        .with_command(args.tesseract.clone())
        .with_language(args.ocr_lang.clone());
    if !ocr.is_available() {
        tracing::warn!(
            command = %args.tesseract,
            "Tesseract not found; scanned PDFs cannot be read"
        );
    }

    let extractor = Extractor::new(Arc::new(backend), Arc::new(ocr));
    Ok(Summarizer::new(extractor, Arc::new(chat), config))
}

async fn summarize(summarizer: &Summarizer, file: PathBuf, response_only: bool) -> anyhow::Result<()> {
    let resolved = resolve_path(&file)?;

    match summarizer.process(resolved.data).await {
        Ok(output) => {
            if !response_only {
                println!("{}", output.extracted_text);
                println!();
            }
            println!("{}", output.llm_response);
            Ok(())
        }
        Err(Error::ExtractionFailed) => {
            println!("Sorry, couldn't extract text from the PDF.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries MCP traffic or CLI output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_summarizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let summarizer = build_summarizer(&cli.pipeline)?;

    match cli.command {
        Some(Command::Summarize {
            file,
            response_only,
        }) => summarize(&summarizer, file, response_only).await,
        Some(Command::Serve {
            resource_dirs,
            allow_private_urls,
        }) => {
            tracing::info!("Starting PDF summarizer MCP server");
            run_server(
                summarizer,
                ServerConfig {
                    resource_dirs,
                    allow_private_urls,
                    ..ServerConfig::default()
                },
            )
            .await
        }
        None => {
            tracing::info!("Starting PDF summarizer MCP server");
            run_server(summarizer, ServerConfig::default()).await
        }
    }
}
