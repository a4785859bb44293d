use anyhow::{Context, Result};
use blockdex::index::stats::{dump_index, show_stats};
use blockdex::index::{build_index_from_file, BlockMerger, IndexConfig};
use blockdex::utils::DocumentTokenizer;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blockdex")]
#[command(about = "Build block-merged inverted index files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a file of `<posting-id><TAB><text>` lines
    Build {
        /// Document file
        input: PathBuf,

        /// Index file to create; blocks are written next to it as <output>_<n>
        #[arg(short, long)]
        output: PathBuf,

        /// Documents per block
        #[arg(short = 'n', long)]
        docs_per_block: Option<usize>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep block files after merging
        #[arg(long)]
        keep_blocks: bool,

        /// Wait for each block write before continuing
        #[arg(long)]
        sync_flush: bool,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Merge existing block files into one index
    Merge {
        /// Index file to create
        output: PathBuf,

        /// Block files, in block order
        #[arg(required = true)]
        blocks: Vec<PathBuf>,
    },
    /// Print every record of a block or index file
    Dump {
        file: PathBuf,
    },
    /// Show statistics for a block or index file
    Stats {
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            docs_per_block,
            config,
            keep_blocks,
            sync_flush,
            quiet,
        } => {
            let mut cfg = match config {
                Some(path) => IndexConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => IndexConfig::default(),
            };
            if let Some(n) = docs_per_block {
                cfg.docs_per_block = n;
            }
            cfg.keep_blocks |= keep_blocks;
            cfg.background_flush &= !sync_flush;
            cfg.show_progress &= !quiet;

            let tokenizer = DocumentTokenizer::new().context("Failed to build tokenizer")?;
            let summary = build_index_from_file(&input, &output, cfg, &tokenizer)
                .with_context(|| format!("Failed to index {}", input.display()))?;

            println!(
                "Indexed {} documents: {} blocks, {} terms, {} postings",
                summary.documents,
                summary.blocks.len(),
                summary.merge.terms,
                summary.merge.postings
            );
            println!("Index stored at: {}", output.display());
        }
        Commands::Merge { output, blocks } => {
            let summary = BlockMerger::new(&output, blocks)
                .merge()
                .with_context(|| format!("Failed to merge into {}", output.display()))?;
            println!(
                "Merged {} blocks: {} terms, {} postings",
                summary.blocks, summary.terms, summary.postings
            );
        }
        Commands::Dump { file } => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            dump_index(&file, &mut out).with_context(|| format!("Failed to read {}", file.display()))?;
            out.flush()?;
        }
        Commands::Stats { file } => {
            show_stats(&file)?;
        }
    }

    Ok(())
}
