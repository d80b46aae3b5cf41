use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::cli::StatsArgs;
use crate::formats::BookRecord;
use crate::store::KeyValueStore;

const UNKNOWN: &str = "Unknown";

static SERIES_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)S(\d+)").expect("valid series number pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub owned: usize,
    pub read: usize,
}

impl Counts {
    pub fn pct_read(&self) -> u32 {
        percent(self.read, self.total)
    }

    pub fn pct_owned(&self) -> u32 {
        percent(self.owned, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesStats {
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SagaStats {
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub series: Vec<SeriesStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    #[serde(flatten)]
    pub totals: Counts,
    pub pct_read: u32,
    pub sagas: Vec<SagaStats>,
}

pub fn run(args: StatsArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let catalog = Catalog::load(store).context("load catalog")?;
    let stats = compute(&catalog);

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &stats).context("serialize stats")?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", render_text(&stats))?;
    }
    stdout.flush().context("flush stats")?;
    Ok(())
}

pub fn compute(catalog: &Catalog) -> CatalogStats {
    let totals = count_where(catalog, |_| true);

    let mut saga_names: Vec<&str> = catalog.books.iter().map(|b| saga_name(&b.saga)).collect();
    saga_names.sort_unstable();
    saga_names.dedup();

    let sagas = saga_names
        .into_iter()
        .map(|saga| SagaStats {
            name: saga.to_owned(),
            counts: count_where(catalog, |b| saga_name(&b.saga) == saga),
            series: series_for_saga(catalog, saga),
        })
        .collect();

    CatalogStats {
        pct_read: totals.pct_read(),
        totals,
        sagas,
    }
}

fn series_for_saga(catalog: &Catalog, saga: &str) -> Vec<SeriesStats> {
    let mut series: BTreeMap<&str, (u64, Counts)> = BTreeMap::new();
    for book in catalog.books.iter().filter(|b| saga_name(&b.saga) == saga) {
        let name = series_name(&book.series);
        let entry = series.entry(name).or_insert((u64::MAX, Counts::default()));
        entry.0 = entry.0.min(series_number(&book.id).unwrap_or(u64::MAX));
        entry.1.total += 1;
        if catalog.owned.contains(&book.id) {
            entry.1.owned += 1;
        }
        if catalog.read.contains(&book.id) {
            entry.1.read += 1;
        }
    }

    let mut ordered: Vec<(&str, (u64, Counts))> = series.into_iter().collect();
    ordered.sort_by(|a, b| a.1.0.cmp(&b.1.0).then_with(|| a.0.cmp(b.0)));
    ordered
        .into_iter()
        .map(|(name, (_, counts))| SeriesStats {
            name: name.to_owned(),
            counts,
        })
        .collect()
}

/// First `S<digits>` number in a book id, e.g. `S02-07` gives 2.
pub fn series_number(id: &str) -> Option<u64> {
    SERIES_NUMBER
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Display name of a saga; books without one are grouped as `Unknown`.
pub fn saga_name(saga: &str) -> &str {
    if saga.is_empty() { UNKNOWN } else { saga }
}

pub fn series_name(series: &str) -> &str {
    if series.is_empty() { UNKNOWN } else { series }
}

fn count_where(catalog: &Catalog, keep: impl Fn(&BookRecord) -> bool) -> Counts {
    let mut counts = Counts::default();
    for book in catalog.books.iter().filter(|b| keep(b)) {
        counts.total += 1;
        if catalog.owned.contains(&book.id) {
            counts.owned += 1;
        }
        if catalog.read.contains(&book.id) {
            counts.read += 1;
        }
    }
    counts
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn render_text(stats: &CatalogStats) -> String {
    let mut out = format!(
        "Books: {}  Owned: {}  Read: {} ({}%)\n",
        stats.totals.total, stats.totals.owned, stats.totals.read, stats.pct_read
    );
    if stats.sagas.is_empty() {
        out.push_str("No data.\n");
    }
    for saga in &stats.sagas {
        out.push_str(&format!(
            "\nSaga: {}  Read {}/{} ({}%)  Owned {}/{} ({}%)\n",
            saga.name,
            saga.counts.read,
            saga.counts.total,
            saga.counts.pct_read(),
            saga.counts.owned,
            saga.counts.total,
            saga.counts.pct_owned(),
        ));
        for series in &saga.series {
            out.push_str(&format!(
                "  {}  {}/{} read, {}/{} owned\n",
                series.name,
                series.counts.read,
                series.counts.total,
                series.counts.owned,
                series.counts.total,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn book(id: &str, saga: &str, series: &str) -> BookRecord {
        let mut book = BookRecord::new(id, format!("Title {id}"));
        book.saga = saga.to_owned();
        book.series = series.to_owned();
        book
    }

    fn catalog_with(
        books: Vec<BookRecord>,
        owned: &[&str],
        read: &[&str],
    ) -> anyhow::Result<Catalog> {
        let store = MemoryStore::new();
        let mut catalog = Catalog::load(&store)?;
        catalog.replace_books(&store, books)?;
        catalog.owned = owned.iter().map(|id| (*id).to_owned()).collect();
        catalog.read = read.iter().map(|id| (*id).to_owned()).collect();
        Ok(catalog)
    }

    #[test]
    fn totals_and_rounded_percentages() -> anyhow::Result<()> {
        let catalog = catalog_with(
            vec![
                book("S01-01", "A", "One"),
                book("S01-02", "A", "One"),
                book("S01-03", "A", "One"),
            ],
            &["S01-01"],
            &["S01-01", "S01-02", "missing"],
        )?;
        let stats = compute(&catalog);
        assert_eq!(
            stats.totals,
            Counts {
                total: 3,
                owned: 1,
                read: 2
            }
        );
        assert_eq!(stats.pct_read, 67);
        assert_eq!(stats.totals.pct_owned(), 33);
        Ok(())
    }

    #[test]
    fn sagas_sorted_by_name_and_series_by_id_number() -> anyhow::Result<()> {
        let catalog = catalog_with(
            vec![
                book("S10-40", "Tom and Elenna", "Later Series"),
                book("s02-07", "Tom and Elenna", "Golden Armour"),
                book("S01-01", "Tom and Elenna", "Where It All Began"),
                book("X-1", "Tom and Elenna", "Alpha Extras"),
                book("S03-01", "", ""),
            ],
            &[],
            &["S01-01"],
        )?;
        let stats = compute(&catalog);

        let sagas: Vec<&str> = stats.sagas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(sagas, vec!["Tom and Elenna", "Unknown"]);

        let series: Vec<&str> = stats.sagas[0]
            .series
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(
            series,
            vec!["Where It All Began", "Golden Armour", "Later Series", "Alpha Extras"]
        );
        assert_eq!(stats.sagas[1].series[0].name, "Unknown");
        assert_eq!(stats.sagas[0].series[0].counts.read, 1);
        Ok(())
    }

    #[test]
    fn empty_catalog_renders_no_data() -> anyhow::Result<()> {
        let catalog = catalog_with(Vec::new(), &[], &[])?;
        let stats = compute(&catalog);
        assert_eq!(stats.pct_read, 0);
        assert!(render_text(&stats).contains("No data."));
        Ok(())
    }

    #[test]
    fn series_number_reads_first_match() {
        assert_eq!(series_number("S02-07"), Some(2));
        assert_eq!(series_number("book-s7"), Some(7));
        assert_eq!(series_number("X-1"), None);
    }
}
