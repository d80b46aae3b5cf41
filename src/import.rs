use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::books_json::books_from_json;
use crate::catalog::Catalog;
use crate::cli::{BookFormat, DetectArgs, ImportArgs};
use crate::csv::{
    ErrorMode, ImportOptions, NumberPolicy, delimiter_name, detect_delimiter,
    import_books_collecting,
};
use crate::formats::BookRecord;
use crate::store::KeyValueStore;

pub fn detect(args: DetectArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input))?;
    let delimiter = detect_delimiter(&text);
    tracing::debug!(input = %args.input, delimiter = ?delimiter, "detected delimiter");
    println!("{}", delimiter_name(delimiter));
    Ok(())
}

/// Reads and validates the input, then replaces the stored catalog.
///
/// Nothing is written unless every row is valid.
pub fn run(args: ImportArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input))?;
    let format = args
        .format
        .unwrap_or_else(|| format_from_extension(Path::new(&args.input)));

    let books = parse_books(&text, format, &args)?;
    tracing::info!(
        input = %args.input,
        format = ?format,
        books = books.len(),
        "parsed books"
    );

    if args.dry_run {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &books).context("serialize books")?;
        writeln!(stdout)?;
        return Ok(());
    }

    let mut catalog = Catalog::load(store).context("load catalog")?;
    let count = books.len();
    catalog
        .replace_books(store, books)
        .context("save imported books")?;
    tracing::info!(books = count, "catalog replaced");

    Ok(())
}

pub fn parse_books(
    text: &str,
    format: BookFormat,
    args: &ImportArgs,
) -> anyhow::Result<Vec<BookRecord>> {
    match format {
        BookFormat::Json => books_from_json(text),
        BookFormat::Csv => {
            let options = ImportOptions {
                delimiter: args.delimiter,
                error_mode: if args.collect_errors {
                    ErrorMode::CollectAll
                } else {
                    ErrorMode::FailFast
                },
                numbers: if args.strict_numbers {
                    NumberPolicy::Strict
                } else {
                    NumberPolicy::Lenient
                },
            };
            let books = import_books_collecting(text, &options)
                .with_context(|| format!("import failed: {}", args.input))?;
            Ok(books)
        }
    }
}

fn format_from_extension(path: &Path) -> BookFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => BookFormat::Json,
        _ => BookFormat::Csv,
    }
}
