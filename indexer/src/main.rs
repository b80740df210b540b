use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notedex_core::{MarkdownDir, SearchIndex};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "notedex")]
#[command(about = "Maintain and query a document collection's search index", long_about = None)]
struct Cli {
    /// Collection root; the index lives in <root>/.search
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Print results as a JSON array instead of one title per line
    #[arg(long, default_value_t = false, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index directories
    Init,
    /// Index a document, replacing any previous version with the same title
    Insert {
        #[arg(long)]
        title: String,
        /// Document text
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the document text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Remove a document from the index
    Delete {
        #[arg(long)]
        title: String,
    },
    /// Print titles matching all query terms, most recent first
    Search {
        /// Query text; empty lists every document
        #[arg(default_value = "")]
        query: String,
    },
    /// Index every *.md file of a directory, oldest first
    Seed {
        /// Directory holding the documents
        #[arg(long)]
        docs: PathBuf,
        /// Only seed when the index is still empty
        #[arg(long, default_value_t = false)]
        if_empty: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let index = SearchIndex::new(&cli.root);
    index.init().with_context(|| format!("initializing index under {}", cli.root.display()))?;

    match cli.command {
        Commands::Init => {
            tracing::info!(root = %cli.root.display(), "index ready");
        }
        Commands::Insert { title, content, file } => {
            let content = match (content, file) {
                (Some(text), None) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("one of --content or --file is required"),
                (Some(_), Some(_)) => bail!("--content and --file are mutually exclusive"),
            };
            let id = index.insert_or_update(&title, &content)?;
            tracing::info!(title = title.as_str(), id, "inserted");
        }
        Commands::Delete { title } => {
            if !index.delete(&title)? {
                tracing::warn!(title = title.as_str(), "title was not indexed");
            }
        }
        Commands::Search { query } => {
            let titles = index.search(&query)?;
            print_titles(&titles, cli.json)?;
        }
        Commands::Seed { docs, if_empty } => {
            let source = MarkdownDir::new(&docs);
            if if_empty {
                let seeded = index.ensure_seeded(&source)?;
                tracing::info!(seeded, docs = %docs.display(), "seed check finished");
            } else {
                let count = index.seed(&source)?;
                tracing::info!(count, docs = %docs.display(), "seed finished");
            }
        }
    }
    Ok(())
}

fn print_titles(titles: &[String], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(titles)?);
    } else {
        for title in titles {
            println!("{title}");
        }
    }
    Ok(())
}
