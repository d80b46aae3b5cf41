use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::csv::parse_delimiter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Catalog store file (default: $BOOKQUEST_STORE, then `bookquest.json`).
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Only log warnings and errors unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the delimiter a CSV file would be read with.
    Detect(DetectArgs),
    /// Replace the catalog with books from a CSV or JSON file.
    Import(ImportArgs),
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
    /// Mark a book owned and/or read.
    Mark(MarkArgs),
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
    /// Browse books by saga and series with owned/read marks.
    List(ListArgs),
    Stats(StatsArgs),
    Achievements(AchievementsArgs),
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// CSV file to sample.
    #[arg(long)]
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BookFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Book list to import.
    #[arg(long)]
    pub input: String,

    /// Input format (default: from the file extension, else csv).
    #[arg(long, value_enum)]
    pub format: Option<BookFormat>,

    /// CSV field separator: a single character or comma/semicolon/tab/pipe.
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    /// Report every invalid CSV row instead of stopping at the first.
    #[arg(long)]
    pub collect_errors: bool,

    /// Reject non-numeric number/seriesIndex cells instead of ignoring them.
    #[arg(long)]
    pub strict_numbers: bool,

    /// Print the normalized books as JSON without touching the store.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Write the book list.
    Books(ExportBooksArgs),
    /// Write owned/read flags as JSON.
    State(ExportStateArgs),
}

#[derive(Debug, Args)]
pub struct ExportBooksArgs {
    /// Output file path.
    #[arg(long)]
    pub out: String,

    #[arg(long, value_enum, default_value_t = BookFormat::Json)]
    pub format: BookFormat,

    /// Overwrite the output if it exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ExportStateArgs {
    /// Output file path.
    #[arg(long)]
    pub out: String,

    /// Overwrite the output if it exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Book id.
    pub id: String,

    #[arg(long)]
    pub owned: bool,

    #[arg(long)]
    pub read: bool,

    /// Clear the selected flags instead of setting them.
    #[arg(long)]
    pub unset: bool,
}

#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// Replace owned/read flags from a JSON file written by `export state`.
    Import(StateImportArgs),
    /// Clear all owned/read flags.
    Clear,
}

#[derive(Debug, Args)]
pub struct StateImportArgs {
    #[arg(long)]
    pub input: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show this saga (case-insensitive), expanded.
    #[arg(long)]
    pub saga: Option<String>,

    /// Only show this series (case-insensitive), expanded.
    #[arg(long)]
    pub series: Option<String>,

    /// Expand every saga and series, and remember it.
    #[arg(long, conflicts_with = "collapse_all")]
    pub expand_all: bool,

    /// Collapse every saga and series, and remember it.
    #[arg(long)]
    pub collapse_all: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AchievementsArgs {
    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,
}
