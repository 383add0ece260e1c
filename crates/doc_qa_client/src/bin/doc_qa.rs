//! doc-qa: ask a question about local documents and print the answer as it
//! streams in.
//!
//! ```bash
//! doc-qa -f report.pdf "Summarize page 1"
//! echo "Compare them" | doc-qa -f a.pdf -f b.pdf --url http://127.0.0.1:5000
//! RUST_LOG=doc_qa_client=debug doc-qa -f report.pdf "What is the total?"
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use doc_qa_client::config::{self, Config};
use doc_qa_client::{ConversationState, Document, RenderOutcome, SubmitError, UploadBatch};
use tracing::debug;

/// Ask a question about one or more documents.
#[derive(Parser, Debug)]
#[command(name = "doc-qa", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DOC_QA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Document to attach; repeat for several
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Question; read from the first line of stdin when omitted
    question: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn load_config(args: &Args) -> Config {
    let source = config::resolve_config_path(args.config.as_deref());
    debug!(?source, "resolved config");
    let mut cfg = config::load_from(&source).unwrap_or_else(|e| fail(e));
    if let Some(url) = &args.url {
        cfg.server.base_url = Some(url.clone());
    }
    cfg
}

fn read_question(arg: Option<String>) -> String {
    if let Some(q) = arg {
        return q;
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().to_string()
}

fn read_documents(paths: &[PathBuf]) -> Vec<Document> {
    paths
        .iter()
        .map(|path| {
            Document::from_path(path)
                .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)))
        })
        .collect()
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let cfg = load_config(&args);
    let batch = UploadBatch::new(
        read_documents(&args.files),
        read_question(args.question.clone()),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("failed to create runtime: {}", e)));

    let outcome = rt.block_on(async {
        let state = ConversationState::from_config(&cfg).unwrap_or_else(|e| fail(e));
        let rx = state.subscribe();

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let (rendered, submitted) = tokio::join!(
            doc_qa_client::follow(rx, &mut out),
            state.submit(&batch)
        );
        let _ = out.flush();

        match submitted {
            Err(SubmitError::Busy) => fail(SubmitError::Busy),
            Err(SubmitError::Validation(e)) => RenderOutcome::Rejected(e.to_string()),
            Ok(_) => rendered.unwrap_or_else(|e| fail(format!("cannot write output: {}", e))),
        }
    });

    match outcome {
        RenderOutcome::Complete => {}
        RenderOutcome::Failed(message) | RenderOutcome::Rejected(message) => fail(message),
    }
}
