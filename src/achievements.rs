use std::collections::{BTreeMap, BTreeSet};
use std::io::Write as _;

use anyhow::Context as _;
use serde::Serialize;

use crate::catalog::{Catalog, series_key};
use crate::cli::AchievementsArgs;
use crate::formats::BookRecord;
use crate::store::{KeyValueStore, keys, load_json, save_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Group {
    Mastery,
    Read,
    Owned,
    Series,
    Saga,
    Firsts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Threshold {
    Count(usize),
    All,
}

const THRESHOLDS: [Threshold; 7] = [
    Threshold::Count(5),
    Threshold::Count(10),
    Threshold::Count(25),
    Threshold::Count(50),
    Threshold::Count(100),
    Threshold::Count(200),
    Threshold::All,
];

const READ_NAMES: [&str; 7] = [
    "Apprentice Adventurer",
    "Beast Tracker",
    "Quest Knight",
    "Realm Ranger",
    "Master Beastbreaker",
    "Saga Sentinel",
    "The Complete Bestiary",
];

const OWN_NAMES: [&str; 7] = [
    "Collector's Pouch",
    "Keeper of Scrolls",
    "Lore Archivist",
    "Vault Curator",
    "Grand Librarian",
    "Warden of the Vault",
    "The Grand Codex",
];

const FIRST_SIX: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: String,
    pub group: Group,
    pub label: String,
    pub slug: String,
    pub achieved: bool,
    pub progress: String,
}

/// Every badge for the catalog, in display order.
pub fn evaluate(catalog: &Catalog) -> Vec<Achievement> {
    let total = catalog.books.len();
    let read = catalog.read_count();
    let owned = catalog.owned_count();

    let mut items = Vec::new();
    for (kind, count, names, group) in [
        ("read", read, READ_NAMES, Group::Read),
        ("own", owned, OWN_NAMES, Group::Owned),
    ] {
        let verb = if kind == "read" { "Read" } else { "Own" };
        for (threshold, name) in THRESHOLDS.into_iter().zip(names) {
            let (slug, target, achieved) = match threshold {
                Threshold::Count(n) => (n.to_string(), n.to_string(), count >= n),
                Threshold::All => (
                    "all".to_owned(),
                    "All".to_owned(),
                    total > 0 && count >= total,
                ),
            };
            let shown = match threshold {
                Threshold::Count(n) => count.min(n),
                Threshold::All => count.min(total),
            };
            items.push(Achievement {
                id: format!("{kind}-{target}"),
                group,
                label: format!("{name} — {verb} {target}"),
                slug: format!("{kind}-{slug}"),
                achieved,
                progress: format!("{shown}/{target}"),
            });
        }
    }

    let ratio = |count: usize, at_least: f64| total > 0 && count as f64 / total as f64 >= at_least;
    items.extend([
        badge(
            "read-50pct",
            Group::Read,
            "Halfway There — Read ≥ 50%",
            ratio(read, 0.5),
            format!("{read}/{total}"),
        ),
        badge(
            "read-75pct",
            Group::Read,
            "Three Quarters — Read ≥ 75%",
            ratio(read, 0.75),
            format!("{read}/{total}"),
        ),
        badge(
            "own-50pct",
            Group::Owned,
            "Collector’s Majority — Own ≥ 50%",
            ratio(owned, 0.5),
            format!("{owned}/{total}"),
        ),
        badge(
            "double-mastery",
            Group::Mastery,
            "Double Mastery — Own & Read 100%",
            total > 0 && read == total && owned == total,
            format!("{read}/{total}"),
        ),
        badge(
            "first-read",
            Group::Firsts,
            "First Steps — First book read",
            read >= 1,
            format!("{read}/1"),
        ),
        badge(
            "first-owned",
            Group::Firsts,
            "First Find — First book owned",
            owned >= 1,
            format!("{owned}/1"),
        ),
    ]);

    let first_six = numbers_read(catalog, &FIRST_SIX);
    items.push(badge(
        "first-six",
        Group::Read,
        "All First Six — Read #1–6",
        first_six == FIRST_SIX.len(),
        format!("{first_six}/{}", FIRST_SIX.len()),
    ));

    let mut any_own_all = false;
    let mut any_perfect = false;
    for ((saga, series), tally) in tally_by(catalog, |b| (b.saga.clone(), b.series.clone())) {
        let read_all = tally.read == tally.total;
        let own_all = tally.owned == tally.total;
        any_own_all |= own_all;
        any_perfect |= read_all && own_all;
        items.push(Achievement {
            id: format!("series-finish:{}", series_key(&saga, &series)),
            group: Group::Series,
            label: format!("Series Finisher — {}", series_title(&saga, &series)),
            slug: "series-finish".to_owned(),
            achieved: read_all,
            progress: format!("{}/{}", tally.read, tally.total),
        });
    }
    items.extend([
        badge(
            "gap-hunter",
            Group::Owned,
            "Gap Hunter — Own all books in any series",
            any_own_all,
            format!("{}/1", u8::from(any_own_all)),
        ),
        badge(
            "perfect-series",
            Group::Mastery,
            "Perfect Series — Own & read all books in a series",
            any_perfect,
            format!("{}/1", u8::from(any_perfect)),
        ),
    ]);

    let by_saga = tally_by(catalog, |b| {
        if b.saga.is_empty() {
            "Unknown".to_owned()
        } else {
            b.saga.clone()
        }
    });
    for (saga, tally) in by_saga {
        items.push(Achievement {
            id: format!("saga-conquer:{saga}"),
            group: Group::Saga,
            label: format!("Saga Conqueror — {saga}"),
            slug: "saga-conquer".to_owned(),
            achieved: tally.read == tally.total,
            progress: format!("{}/{}", tally.read, tally.total),
        });
    }

    items.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| slug_priority(&a.slug).cmp(&slug_priority(&b.slug)))
            .then_with(|| natural_cmp(&a.label, &b.label))
    });
    items
}

pub fn run(args: AchievementsArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let catalog = Catalog::load(store).context("load catalog")?;
    let items = evaluate(&catalog);
    let newly = record_unlocked(store, &items).context("record unlocked achievements")?;
    for id in &newly {
        tracing::info!(achievement = %id, "achievement unlocked");
    }

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &items).context("serialize achievements")?;
        writeln!(stdout)?;
    } else {
        for item in &items {
            let status = if item.achieved {
                "Unlocked".to_owned()
            } else {
                item.progress.clone()
            };
            writeln!(stdout, "[{:?}] {}  {status}", item.group, item.label)?;
        }
    }
    stdout.flush().context("flush achievements")?;
    Ok(())
}

/// Adds achieved ids to the persisted unlock list and returns the new ones.
pub fn record_unlocked(
    store: &dyn KeyValueStore,
    items: &[Achievement],
) -> anyhow::Result<Vec<String>> {
    let mut unlocked: BTreeSet<String> =
        load_json(store, keys::ACHIEVEMENTS_UNLOCKED, BTreeSet::new())?;
    let newly: Vec<String> = items
        .iter()
        .filter(|item| item.achieved && !unlocked.contains(&item.id))
        .map(|item| item.id.clone())
        .collect();
    if !newly.is_empty() {
        unlocked.extend(newly.iter().cloned());
        save_json(store, keys::ACHIEVEMENTS_UNLOCKED, &unlocked)?;
    }
    Ok(newly)
}

fn badge(id: &str, group: Group, label: &str, achieved: bool, progress: String) -> Achievement {
    Achievement {
        id: id.to_owned(),
        group,
        label: label.to_owned(),
        slug: id.to_owned(),
        achieved,
        progress,
    }
}

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    owned: usize,
    read: usize,
}

fn tally_by<K: Ord>(
    catalog: &Catalog,
    key: impl Fn(&BookRecord) -> K,
) -> BTreeMap<K, Tally> {
    let mut map: BTreeMap<K, Tally> = BTreeMap::new();
    for book in &catalog.books {
        let tally = map.entry(key(book)).or_default();
        tally.total += 1;
        if catalog.owned.contains(&book.id) {
            tally.owned += 1;
        }
        if catalog.read.contains(&book.id) {
            tally.read += 1;
        }
    }
    map
}

/// How many of `numbers` belong to a read book.
fn numbers_read(catalog: &Catalog, numbers: &[f64]) -> usize {
    numbers
        .iter()
        .filter(|&&n| {
            catalog
                .books
                .iter()
                .any(|b| b.number == Some(n) && catalog.read.contains(&b.id))
        })
        .count()
}

fn series_title(saga: &str, series: &str) -> String {
    let series = if series.is_empty() {
        "Unknown Series"
    } else {
        series
    };
    if saga.is_empty() {
        series.to_owned()
    } else {
        format!("{saga} — {series}")
    }
}

fn slug_priority(slug: &str) -> u32 {
    const MILESTONES: [&str; 7] = ["5", "10", "25", "50", "100", "200", "all"];
    if let Some((kind, rest)) = slug.split_once('-')
        && (kind == "read" || kind == "own")
        && let Some(pos) = MILESTONES.iter().position(|m| *m == rest)
    {
        return pos as u32;
    }
    match slug {
        "read-50pct" => 10,
        "read-75pct" => 11,
        "own-50pct" => 12,
        "double-mastery" => 20,
        "first-read" => 30,
        "first-owned" => 31,
        "first-six" => 32,
        "series-finish" => 40,
        "saga-conquer" => 50,
        "gap-hunter" => 60,
        "perfect-series" => 61,
        _ => 99,
    }
}

/// Compares strings with embedded digit runs ordered by value.
fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let ordering = left.cmp(&right);
                if ordering.is_ne() {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering.is_ne() {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u128 {
    let mut value: u128 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(u128::from(digit));
        chars.next();
    }
    value
}
