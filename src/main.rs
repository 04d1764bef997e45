//! # Pagemark CLI
//!
//! The `pagemark` binary exercises the pagination and citation-addressing
//! core against real files: decode a document and inspect its page table,
//! resolve the citation tokens of a generated answer against a selection of
//! sources, run the citation-injection fallback, or print the context
//! payload that would be handed to an answer generator.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pagemark pages <FILE>` | Decode a document and print its page table |
//! | `pagemark resolve <ANSWER> --source <FILE>...` | Resolve citation tokens against sources |
//! | `pagemark inject <ANSWER> --source <FILE>...` | Guarantee the answer carries a citation |
//! | `pagemark context --source <FILE>...` | Print the generator context payload |
//!
//! ## Examples
//!
//! ```bash
//! # Page table of a PDF
//! pagemark pages report.pdf
//!
//! # Resolve "[18]"-style tokens in answer.txt against two sources
//! pagemark resolve answer.txt --source report.pdf --source notes.txt
//!
//! # Context rows as JSON
//! pagemark context --source report.pdf --json
//! ```

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;

use pagemark::citation;
use pagemark::config::{self, Config};
use pagemark::context::build_context;
use pagemark::extract;
use pagemark::inject;
use pagemark::models::{PageContent, Source, SourceKind};
use pagemark::paginate::{paginate, PaginateOptions};
use pagemark::registry::SourceRegistry;

/// Pagemark — document pagination and citation addressing for
/// source-grounded chat.
#[derive(Parser)]
#[command(
    name = "pagemark",
    about = "Document pagination and citation addressing for source-grounded chat",
    version,
    long_about = "Pagemark splits documents into stable, citable pages, concatenates \
    selected sources into one global page space, and maps citation tokens in generated \
    answers back to the source and page they reference."
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Decode a document and print its page table.
    ///
    /// PDF pages, worksheets, and Word sections map to native pages; plain
    /// text is cut into virtual pages at sentence boundaries.
    Pages {
        /// The document to paginate (pdf, docx, xlsx, txt, md).
        file: PathBuf,

        /// Print full page text instead of a preview.
        #[arg(long)]
        full: bool,
    },

    /// Resolve the citation tokens of a generated answer.
    ///
    /// Sources are loaded in the order given; that order defines the global
    /// page space and the doc-index space citations refer to. Unresolvable
    /// tokens are reported and skipped.
    Resolve {
        /// File containing the generated answer text.
        answer: PathBuf,

        /// Source document; repeat in selection order.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
    },

    /// Guarantee a generated answer carries at least one citation.
    ///
    /// Prints the answer unchanged when it already cites; otherwise appends
    /// one citation referencing the middle page of the first source.
    Inject {
        /// File containing the generated answer text.
        answer: PathBuf,

        /// Source document; repeat in selection order.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
    },

    /// Print the context payload handed to the answer generator.
    Context {
        /// Source document; repeat in selection order.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let options = cfg.pagination.options();

    match cli.command {
        Commands::Pages { file, full } => {
            let source = load_source(&file, &options)?;
            print_pages(&source, full);
        }
        Commands::Resolve { answer, sources } => {
            let answer_text = read_answer(&answer)?;
            let registry = load_registry(&sources, &options)?;
            run_resolve(&answer_text, &registry);
        }
        Commands::Inject { answer, sources } => {
            let answer_text = read_answer(&answer)?;
            let registry = load_registry(&sources, &options)?;
            println!("{}", inject::ensure_citations(&answer_text, &registry.snapshot()));
        }
        Commands::Context { sources, json } => {
            let registry = load_registry(&sources, &options)?;
            let rows = build_context(&registry);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "[{}:{}] {}  {}",
                        row.source_index,
                        row.local_page,
                        row.source_name,
                        preview(&row.text, 60)
                    );
                }
            }
        }
    }

    Ok(())
}

/// Decode and paginate one file into a source.
fn load_source(path: &Path, options: &PaginateOptions) -> Result<Source> {
    let content = extract::extract_path(path)
        .with_context(|| format!("Failed to extract {}", path.display()))?;
    let pages = paginate(&content, options);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Source::new(
        SourceKind::File,
        name,
        content.plain_text(),
        pages,
    ))
}

/// Load files into a registry in the given selection order.
fn load_registry(paths: &[PathBuf], options: &PaginateOptions) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    for path in paths {
        registry.add(load_source(path, options)?);
    }
    Ok(registry)
}

fn read_answer(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answer file: {}", path.display()))
}

fn print_pages(source: &Source, full: bool) {
    println!("source: {} ({})", source.name, source.kind.label());
    println!("pages:  {}", source.page_count());
    println!();
    for page in &source.pages {
        let label = match &page.content {
            PageContent::PdfPage { .. } => "pdf".to_string(),
            PageContent::TextChunk { .. } => "text".to_string(),
            PageContent::StructuredBlocks { .. } => "structured".to_string(),
            PageContent::SheetPage { sheet_name, .. } => format!("sheet '{}'", sheet_name),
            PageContent::TranscriptSegment { start_secs, .. } => {
                format!("transcript @{}s", start_secs)
            }
        };
        let text = page.content.renderable_text();
        if full {
            println!("--- page {} ({}) ---", page.number, label);
            println!("{}", text);
            println!();
        } else {
            println!(
                "page {:>4}  {:<16} {:>7} chars  {}",
                page.number,
                label,
                text.chars().count(),
                preview(text, 48)
            );
        }
    }
}

fn run_resolve(answer: &str, registry: &SourceRegistry) {
    let snapshot = registry.snapshot();
    let results = citation::resolve_all(answer, &snapshot);

    if results.is_empty() {
        println!("no citation tokens found");
        return;
    }

    for (token, resolved) in &results {
        match resolved {
            Ok(citation) => {
                let pages = if citation.start_page == citation.end_page {
                    format!("page {}", citation.start_page)
                } else {
                    format!("pages {}-{}", citation.start_page, citation.end_page)
                };
                println!(
                    "{:<10} -> {} ({})",
                    token.literal(),
                    citation.source_name,
                    pages
                );
            }
            Err(err) => {
                println!("{:<10} -> skipped: {}", token.literal(), err);
            }
        }
    }
}

/// First `max_chars` characters of one line of text.
fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(max_chars).collect();
    if line.chars().count() > max_chars {
        out.push('…');
    }
    out
}
