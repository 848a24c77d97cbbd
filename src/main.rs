use std::path::PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use anyhow::Result;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

use preprocessing_rs::{
    namespace, Config, ComponentKind, Document, Pipeline,
};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Output as JSON (default)
    Json,
    /// One line per extracted section
    Summary,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and curate passages, tables and NQ examples from a file
    Run {
        /// Input file to process (.pdf or .jsonl)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (json or summary)
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Custom configuration file (TOML format)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only read the first N pages of a PDF
        #[arg(long)]
        max_pages: Option<u32>,

        /// Worker threads for curation
        #[arg(long)]
        threads: Option<usize>,

        /// Enable detailed logging
        #[arg(long)]
        verbose: bool,
    },
    /// List the preprocessing components
    Components,
}

fn summarize(document: &Document) -> String {
    let mut out = String::new();
    out.push_str(&format!("source: {}\n", document.source));
    out.push_str(&format!("kind: {}\n", document.kind));
    out.push_str(&format!("passages: {}\n", document.passages.len()));
    out.push_str(&format!("tables: {}\n", document.tables.len()));
    out.push_str(&format!("examples: {}\n", document.examples.len()));

    if let Some(meta) = &document.metadata {
        out.push_str(&format!("duration: {} ms\n", meta.total_duration_ms));
        for step in &meta.steps {
            match (step.kept, step.dropped) {
                (Some(kept), Some(dropped)) => out.push_str(&format!(
                    "step: {} - {} ms (kept {}, dropped {})\n",
                    step.name, step.duration_ms, kept, dropped
                )),
                _ => out.push_str(&format!("step: {} - {} ms\n", step.name, step.duration_ms)),
            }
        }
        for error in &meta.errors {
            out.push_str(&format!("error: {}\n", error));
        }
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            format,
            config: config_path,
            max_pages,
            threads,
            verbose,
        } => {
            if verbose {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .init();
            }

            let mut config = if let Some(path) = config_path {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            } else {
                Config::default()
            };

            if let Some(pages) = max_pages {
                config.pdf.max_pages = Some(pages);
            }
            if let Some(t) = threads {
                config.threads = t;
            }

            rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build_global()?;

            let components = namespace(&config)?;
            let pipeline = Pipeline::from_components(config, components);

            if verbose {
                info!("Processing document: {}", input.display());
            }
            let document = pipeline.run(&input).await?;

            let output = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&document)?,
                OutputFormat::Summary => summarize(&document),
            };
            print!("{}", output);
        }
        Commands::Components => {
            for kind in ComponentKind::ALL {
                println!("{:<18} {:<20} {}", kind.name(), kind.module(), kind.role());
            }
        }
    }

    Ok(())
}
