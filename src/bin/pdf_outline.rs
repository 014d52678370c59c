//! CLI tool converting a directory of PDFs into outline JSON files

use clap::Parser;
use pdf_outline::{run_batch, BatchConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "pdf-outline", version, about = "Extract title and H1-H4 outlines from PDFs")]
struct Args {
    /// Directory containing PDFs (a nested `pdfs/` directory is used if present)
    #[arg(env = "PDF_OUTLINE_INPUT", default_value = "/app/input")]
    input: PathBuf,
    /// Directory receiving one JSON file per PDF
    #[arg(env = "PDF_OUTLINE_OUTPUT", default_value = "/app/output")]
    output: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = BatchConfig::new(args.input, args.output);

    match run_batch(&config) {
        Ok(summary) => {
            println!(
                "Processed {} file(s), {} failed",
                summary.processed, summary.failed
            );
            if summary.processed == 0 && summary.failed > 0 {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
