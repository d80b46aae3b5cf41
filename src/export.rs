use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::catalog::Catalog;
use crate::cli::{BookFormat, ExportBooksArgs, ExportStateArgs};
use crate::csv::write_books_csv;
use crate::store::KeyValueStore;

pub fn books(args: ExportBooksArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let catalog = Catalog::load(store).context("load catalog")?;
    let contents = match args.format {
        BookFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(&catalog.books).context("serialize books")?;
            json.push('\n');
            json
        }
        BookFormat::Csv => write_books_csv(&catalog.books),
    };

    tracing::info!(
        format = ?args.format,
        books = catalog.books.len(),
        out = %args.out,
        "export books"
    );
    write_output(&args.out, args.force, &contents)
}

pub fn state(args: ExportStateArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let catalog = Catalog::load(store).context("load catalog")?;
    let mut json =
        serde_json::to_string_pretty(&catalog.snapshot()).context("serialize state")?;
    json.push('\n');

    tracing::info!(
        owned = catalog.owned.len(),
        read = catalog.read.len(),
        out = %args.out,
        "export state"
    );
    write_output(&args.out, args.force, &json)
}

fn write_output(out: &str, force: bool, contents: &str) -> anyhow::Result<()> {
    if Path::new(out).exists() && !force {
        anyhow::bail!("export output already exists: {out}");
    }
    if let Some(parent) = Path::new(out).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(out)
        .with_context(|| format!("open output: {out}"))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {out}"))?;
    file.flush()
        .with_context(|| format!("flush output: {out}"))?;
    Ok(())
}
