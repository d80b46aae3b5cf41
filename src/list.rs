use std::cmp::Ordering;
use std::io::Write as _;

use anyhow::Context as _;

use crate::catalog::Catalog;
use crate::cli::ListArgs;
use crate::formats::BookRecord;
use crate::stats::{self, Counts};
use crate::store::KeyValueStore;

/// Restricts the listing to one saga and/or series, matched by display name
/// ignoring case. A named group is always shown expanded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filter<'a> {
    pub saga: Option<&'a str>,
    pub series: Option<&'a str>,
}

pub fn run(args: ListArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let mut catalog = Catalog::load(store).context("load catalog")?;
    if args.expand_all || args.collapse_all {
        catalog
            .set_all_collapsed(store, args.collapse_all)
            .context("save collapse state")?;
        tracing::info!(collapsed = args.collapse_all, "updated collapse state");
    }

    let filter = Filter {
        saga: args.saga.as_deref(),
        series: args.series.as_deref(),
    };
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{}", render(&catalog, &filter))?;
    stdout.flush().context("flush list")?;
    Ok(())
}

/// Books grouped by saga then series, in the same order as the stats
/// breakdown. Collapsed groups show only their header line.
pub fn render(catalog: &Catalog, filter: &Filter<'_>) -> String {
    let stats = stats::compute(catalog);
    let forced_open = filter.saga.is_some() || filter.series.is_some();
    let mut out = String::new();

    for saga in &stats.sagas {
        if filter.saga.is_some_and(|want| !same_name(want, &saga.name)) {
            continue;
        }
        let series_list: Vec<_> = saga
            .series
            .iter()
            .filter(|series| filter.series.is_none_or(|want| same_name(want, &series.name)))
            .collect();
        if series_list.is_empty() {
            continue;
        }

        let members: Vec<&BookRecord> = catalog
            .books
            .iter()
            .filter(|b| stats::saga_name(&b.saga) == saga.name)
            .collect();
        let raw_saga = members.first().map_or("", |b| b.saga.as_str());
        let saga_open = forced_open || !catalog.is_saga_collapsed(raw_saga);
        push_group(&mut out, 0, saga_open, &saga.name, &saga.counts);
        if !saga_open {
            continue;
        }

        for series in series_list {
            let mut books: Vec<&BookRecord> = members
                .iter()
                .copied()
                .filter(|b| stats::series_name(&b.series) == series.name)
                .collect();
            let raw_series = books.first().map_or("", |b| b.series.as_str());
            let series_open =
                filter.series.is_some() || !catalog.is_series_collapsed(raw_saga, raw_series);
            push_group(&mut out, 2, series_open, &series.name, &series.counts);
            if !series_open {
                continue;
            }

            books.sort_by(|a, b| reading_order(a, b));
            for book in books {
                let owned = if catalog.owned.contains(&book.id) { 'O' } else { '.' };
                let read = if catalog.read.contains(&book.id) { 'R' } else { '.' };
                out.push_str(&format!("    [{owned}{read}] {}  {}\n", book.id, book.title));
            }
        }
    }

    if out.is_empty() {
        out.push_str("No books.\n");
    }
    out
}

fn push_group(out: &mut String, indent: usize, open: bool, name: &str, counts: &Counts) {
    let marker = if open { '-' } else { '+' };
    out.push_str(&format!(
        "{:indent$}{marker} {name}  read {}/{}  owned {}/{}\n",
        "", counts.read, counts.total, counts.owned, counts.total,
    ));
}

fn same_name(want: &str, name: &str) -> bool {
    want.trim().to_lowercase() == name.to_lowercase()
}

/// Series position, then book number, then id; missing positions sort last.
fn reading_order(a: &BookRecord, b: &BookRecord) -> Ordering {
    missing_last(a.series_index, b.series_index)
        .then_with(|| missing_last(a.number, b.number))
        .then_with(|| a.id.cmp(&b.id))
}

fn missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
