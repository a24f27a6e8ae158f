use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_meta::{Document, ExtractOptions, Extraction, Extractor, TracingSink};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdfmeta",
    about = "Inspect structural metadata of PDF files",
    version,
    author
)]
struct Cli {
    /// Log more detail to stderr (repeat for more). Parse warnings and errors
    /// are always logged.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Fail on any damaged cross-reference section
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version, page count and document information
    Info {
        /// Input PDF file
        input: PathBuf,

        /// Print the whole document as JSON
        #[arg(long)]
        json: bool,

        /// Show catalog and trailer details
        #[arg(short, long)]
        detailed: bool,
    },

    /// List the cross-reference sections and trailers, most recent first
    Chain {
        /// Input PDF file
        input: PathBuf,
    },

    /// Print the XMP packet of the catalog
    Xmp {
        /// Input PDF file
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn extract(input: &Path, strict: bool) -> Result<Extraction> {
    let options = if strict {
        ExtractOptions::strict()
    } else {
        ExtractOptions::lenient()
    };
    // Diagnostics reach stderr through the sink only
    let sink = TracingSink;
    let extraction = Extractor::new()
        .with_options(options)
        .with_sink(&sink)
        .extract_path(input)
        .with_context(|| format!("Failed to parse PDF: {}", input.display()))?;

    let document = &extraction.document;
    tracing::debug!(
        path = %input.display(),
        version = document.version(),
        pages = document.page_count(),
        revisions = document.trailer_chain().len(),
        diagnostics = extraction.diagnostics.len(),
        "extracted metadata"
    );
    Ok(extraction)
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{label}: {value}");
    }
}

fn print_info(input: &Path, document: &Document, detailed: bool) {
    println!("PDF Information for: {}", input.display());
    println!("==========================================");
    println!("PDF Version: {}", document.version());
    println!("Pages: {}", document.page_count());
    print_field("Title", document.title());
    print_field("Author", document.author());
    print_field("Creator", document.creator());
    print_field("Producer", document.producer());
    print_field("Creation Date", document.creation_date());
    print_field("Modification Date", document.mod_date());
    print_field("Description", document.description());
    print_field("ISBN", document.isbn());
    print_field("Publisher", &document.publisher_info());
    print_field("Language", &document.language());
    if let Some(year) = document.year() {
        println!("Year: {year}");
    }

    if detailed {
        print_details(document);
    }
}

fn print_details(document: &Document) {
    let root = document.root();

    println!("\nCatalog:");
    println!("--------");
    print_field("Type", &root.r#type);
    if let Some(pages) = &root.pages {
        println!("Pages Tree: {pages}");
    }
    if let Some(metadata) = &root.metadata {
        println!("Metadata Stream: {metadata}");
    }
    if let Some(labels) = &root.page_labels {
        println!("Page Labels: {labels}");
    }
    print_field("Lang", &root.lang);

    if let Some(metadata) = document.metadata() {
        println!("\nXMP Stream:");
        println!("-----------");
        print_field("Subtype", &metadata.subtype);
        println!("Length: {}", metadata.length);
        println!("Decoded Length: {}", metadata.raw_stream_data.len());
    }

    println!("\nRevisions: {}", document.trailer_chain().len());
    if let Some(latest) = document.trailer_chain().first() {
        print_field("Size", &latest.size);
        print_field("ID", &latest.id_raw);
    }
}

fn print_chain(input: &Path, document: &Document) {
    println!("Cross-reference chain for: {}", input.display());
    println!("==========================================");

    let revisions = document.xref_chain().iter().zip(document.trailer_chain());
    for (index, (table, trailer)) in revisions.enumerate() {
        println!(
            "#{index} xref at {}: {} entries in {} subsection(s)",
            table.section_start,
            table.len(),
            table.subsections.len()
        );
        if trailer.root.is_set() {
            println!("    Root: {}", trailer.root);
        }
        if trailer.info.is_set() {
            println!("    Info: {}", trailer.info);
        }
        if !trailer.size.is_empty() {
            println!("    Size: {}", trailer.size);
        }
        if trailer.has_previous() {
            println!("    Prev: {}", trailer.prev);
        }
        for subsection in table.incomplete_subsections() {
            println!(
                "    incomplete subsection {}: {} of {} entries",
                subsection.first_id,
                subsection.elements.len(),
                subsection.count
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info {
            input,
            json,
            detailed,
        } => {
            let extraction = extract(&input, cli.strict)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                print_info(&input, &extraction.document, detailed);
            }
        }

        Commands::Chain { input } => {
            let extraction = extract(&input, cli.strict)?;
            print_chain(&input, &extraction.document);
        }

        Commands::Xmp { input, output } => {
            let extraction = extract(&input, cli.strict)?;
            let metadata = extraction
                .document
                .metadata()
                .with_context(|| format!("No XMP metadata stream in {}", input.display()))?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, &metadata.raw_stream_data).with_context(|| {
                    format!("Failed to write output file: {}", output_path.display())
                })?;
                tracing::info!(
                    bytes = metadata.raw_stream_data.len(),
                    "wrote XMP packet"
                );
                println!("✓ XMP written to: {}", output_path.display());
            } else {
                println!("{}", metadata.packet());
            }
        }
    }

    Ok(())
}
