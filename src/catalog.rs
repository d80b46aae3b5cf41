use std::collections::BTreeSet;

use crate::formats::{BookRecord, StateSnapshot};
use crate::store::{KeyValueStore, keys, load_json, save_json};

/// Books plus the reader's owned/read flags and collapse preferences.
///
/// Every mutating method persists the parts it touched before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub books: Vec<BookRecord>,
    pub owned: BTreeSet<String>,
    pub read: BTreeSet<String>,
    pub collapsed_series: BTreeSet<String>,
    pub collapsed_sagas: BTreeSet<String>,
}

pub fn series_key(saga: &str, series: &str) -> String {
    format!("{saga}::{series}")
}

impl Catalog {
    /// Loads the catalog, seeding the starter books on first use.
    ///
    /// Nothing is written. Without stored collapse preferences every saga
    /// and series starts collapsed.
    pub fn load(store: &dyn KeyValueStore) -> anyhow::Result<Self> {
        let books: Vec<BookRecord> = load_json(store, keys::BOOKS, starter_books())?;
        let collapsed_series = load_json(store, keys::COLLAPSED_SERIES, series_keys(&books))?;
        let collapsed_sagas = load_json(store, keys::COLLAPSED_SAGAS, saga_names(&books))?;
        Ok(Self {
            owned: load_json(store, keys::OWNED, BTreeSet::new())?,
            read: load_json(store, keys::READ, BTreeSet::new())?,
            books,
            collapsed_series,
            collapsed_sagas,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.books.iter().any(|book| book.id == id)
    }

    pub fn owned_count(&self) -> usize {
        self.books.iter().filter(|b| self.owned.contains(&b.id)).count()
    }

    pub fn read_count(&self) -> usize {
        self.books.iter().filter(|b| self.read.contains(&b.id)).count()
    }

    /// Replaces every book. Owned/read flags are left as they are; sagas
    /// and series the previous books did not have start collapsed.
    pub fn replace_books(
        &mut self,
        store: &dyn KeyValueStore,
        books: Vec<BookRecord>,
    ) -> anyhow::Result<()> {
        let known_series = series_keys(&self.books);
        let known_sagas = saga_names(&self.books);
        self.books = books;
        save_json(store, keys::BOOKS, &self.books)?;

        self.collapsed_series
            .extend(series_keys(&self.books).difference(&known_series).cloned());
        self.collapsed_sagas
            .extend(saga_names(&self.books).difference(&known_sagas).cloned());
        self.save_collapsed(store)
    }

    pub fn is_saga_collapsed(&self, saga: &str) -> bool {
        self.collapsed_sagas.contains(saga)
    }

    pub fn is_series_collapsed(&self, saga: &str, series: &str) -> bool {
        self.collapsed_series.contains(&series_key(saga, series))
    }

    /// Collapses or expands every saga and series in the catalog.
    pub fn set_all_collapsed(
        &mut self,
        store: &dyn KeyValueStore,
        collapsed: bool,
    ) -> anyhow::Result<()> {
        if collapsed {
            self.collapsed_series = series_keys(&self.books);
            self.collapsed_sagas = saga_names(&self.books);
        } else {
            self.collapsed_series.clear();
            self.collapsed_sagas.clear();
        }
        self.save_collapsed(store)
    }

    pub fn replace_state(
        &mut self,
        store: &dyn KeyValueStore,
        snapshot: StateSnapshot,
    ) -> anyhow::Result<()> {
        self.owned = snapshot.owned.into_iter().collect();
        self.read = snapshot.read.into_iter().collect();
        self.save_flags(store)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            owned: self.owned.iter().cloned().collect(),
            read: self.read.iter().cloned().collect(),
        }
    }

    pub fn set_owned(
        &mut self,
        store: &dyn KeyValueStore,
        id: &str,
        on: bool,
    ) -> anyhow::Result<()> {
        toggle(&mut self.owned, id, on);
        save_json(store, keys::OWNED, &self.owned)
    }

    pub fn set_read(
        &mut self,
        store: &dyn KeyValueStore,
        id: &str,
        on: bool,
    ) -> anyhow::Result<()> {
        toggle(&mut self.read, id, on);
        save_json(store, keys::READ, &self.read)
    }

    pub fn clear_state(&mut self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        self.owned.clear();
        self.read.clear();
        self.save_flags(store)
    }

    fn save_flags(&self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        save_json(store, keys::OWNED, &self.owned)?;
        save_json(store, keys::READ, &self.read)
    }

    fn save_collapsed(&self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        save_json(store, keys::COLLAPSED_SERIES, &self.collapsed_series)?;
        save_json(store, keys::COLLAPSED_SAGAS, &self.collapsed_sagas)
    }
}

fn toggle(set: &mut BTreeSet<String>, id: &str, on: bool) {
    if on {
        set.insert(id.to_owned());
    } else {
        set.remove(id);
    }
}

fn series_keys(books: &[BookRecord]) -> BTreeSet<String> {
    books
        .iter()
        .map(|b| series_key(&b.saga, &b.series))
        .collect()
}

/// Named sagas only; books without a saga have no collapse entry.
fn saga_names(books: &[BookRecord]) -> BTreeSet<String> {
    books
        .iter()
        .filter(|b| !b.saga.is_empty())
        .map(|b| b.saga.clone())
        .collect()
}

/// The books shown before anything has been imported.
pub fn starter_books() -> Vec<BookRecord> {
    const SAGA: &str = "Tom and Elenna";
    let entries: [(&str, u32, &str, &str, u32); 12] = [
        ("S01-01", 1, "Ferno the Fire Dragon", "Where It All Began", 1),
        ("S01-02", 2, "Sepron the Sea Serpent", "Where It All Began", 2),
        ("S01-03", 3, "Arcta the Mountain Giant", "Where It All Began", 3),
        ("S01-04", 4, "Tagus the Horse-Man", "Where It All Began", 4),
        ("S01-05", 5, "Nanook the Snow Monster", "Where It All Began", 5),
        ("S01-06", 6, "Epos the Flame Bird", "Where It All Began", 6),
        ("S02-07", 7, "Zepha the Monster Squid", "The Golden Armour", 1),
        ("S02-08", 8, "Claw the Giant Monkey", "The Golden Armour", 2),
        ("S02-09", 9, "Soltra the Stone Charmer", "The Golden Armour", 3),
        ("S02-10", 10, "Vipero the Snake Man", "The Golden Armour", 4),
        ("S02-11", 11, "Arachnid the King of Spiders", "The Golden Armour", 5),
        ("S02-12", 12, "Trillion the Three-Headed Lion", "The Golden Armour", 6),
    ];

    entries
        .into_iter()
        .map(|(id, number, title, series, index)| BookRecord {
            id: id.to_owned(),
            number: Some(f64::from(number)),
            title: title.to_owned(),
            saga: SAGA.to_owned(),
            series: series.to_owned(),
            series_index: Some(f64::from(index)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn first_load_seeds_starters_and_collapses_everything() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let catalog = Catalog::load(&store)?;

        assert_eq!(catalog.books.len(), 12);
        assert_eq!(
            catalog.collapsed_series,
            BTreeSet::from([
                series_key("Tom and Elenna", "The Golden Armour"),
                series_key("Tom and Elenna", "Where It All Began"),
            ])
        );
        assert_eq!(
            catalog.collapsed_sagas,
            BTreeSet::from(["Tom and Elenna".to_owned()])
        );
        assert!(!store.contains(keys::BOOKS)?);
        assert!(!store.contains(keys::COLLAPSED_SERIES)?);
        Ok(())
    }

    #[test]
    fn replacing_books_persists_and_collapses_new_groups() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut catalog = Catalog::load(&store)?;

        let mut book = BookRecord::new("X-1", "Extra");
        book.saga = "New Saga".to_owned();
        book.series = "New Series".to_owned();
        catalog.replace_books(&store, vec![book])?;

        let reloaded = Catalog::load(&store)?;
        assert_eq!(reloaded.books.len(), 1);
        assert!(reloaded.collapsed_sagas.contains("New Saga"));
        assert!(
            reloaded
                .collapsed_series
                .contains(&series_key("New Saga", "New Series"))
        );
        assert!(reloaded.collapsed_sagas.contains("Tom and Elenna"));
        Ok(())
    }

    #[test]
    fn expanded_groups_stay_expanded_across_loads_and_reimports() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut catalog = Catalog::load(&store)?;
        catalog.set_all_collapsed(&store, false)?;

        let reloaded = Catalog::load(&store)?;
        assert!(!reloaded.is_saga_collapsed("Tom and Elenna"));
        assert!(!reloaded.is_series_collapsed("Tom and Elenna", "The Golden Armour"));

        let mut books = starter_books();
        let mut extra = BookRecord::new("S03-13", "Ferno Returns");
        extra.saga = "Tom and Elenna".to_owned();
        extra.series = "The Dark Realm".to_owned();
        books.push(extra);
        catalog.replace_books(&store, books)?;

        let reloaded = Catalog::load(&store)?;
        assert!(!reloaded.is_saga_collapsed("Tom and Elenna"));
        assert!(!reloaded.is_series_collapsed("Tom and Elenna", "Where It All Began"));
        assert!(reloaded.is_series_collapsed("Tom and Elenna", "The Dark Realm"));

        catalog.set_all_collapsed(&store, true)?;
        assert_eq!(Catalog::load(&store)?.collapsed_series.len(), 3);
        Ok(())
    }

    #[test]
    fn flags_toggle_and_clear() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut catalog = Catalog::load(&store)?;

        catalog.set_owned(&store, "S01-01", true)?;
        catalog.set_read(&store, "S01-01", true)?;
        catalog.set_read(&store, "S01-02", true)?;
        catalog.set_read(&store, "S01-02", false)?;

        let reloaded = Catalog::load(&store)?;
        assert_eq!(reloaded.owned_count(), 1);
        assert_eq!(reloaded.read_count(), 1);
        assert_eq!(
            reloaded.snapshot(),
            StateSnapshot {
                owned: vec!["S01-01".to_owned()],
                read: vec!["S01-01".to_owned()],
            }
        );

        catalog.clear_state(&store)?;
        assert_eq!(Catalog::load(&store)?.snapshot(), StateSnapshot::default());
        Ok(())
    }

    #[test]
    fn counts_ignore_ids_outside_the_catalog() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let mut catalog = Catalog::load(&store)?;
        catalog.replace_state(
            &store,
            StateSnapshot {
                owned: vec!["gone".to_owned(), "S01-03".to_owned()],
                read: vec![],
            },
        )?;
        assert_eq!(catalog.owned_count(), 1);
        assert!(catalog.owned.contains("gone"));
        Ok(())
    }
}
