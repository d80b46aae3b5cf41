use super::error::ImportError;

/// A recognized book column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Title,
    Number,
    Saga,
    Series,
    SeriesIndex,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Title,
        Column::Number,
        Column::Saga,
        Column::Series,
        Column::SeriesIndex,
    ];

    /// Accepted header spellings after [`normalize_header`], in lookup order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Id => &["id", "bookid"],
            Column::Title => &["title", "name"],
            Column::Number => &["number", "no", "booknumber", "bookno", "num"],
            Column::Saga => &["saga"],
            Column::Series => &["series"],
            Column::SeriesIndex => &[
                "seriesindex",
                "seriesidx",
                "seriesnumber",
                "seriesno",
                "seriesnum",
                "idx",
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Title => "title",
            Column::Number => "number",
            Column::Saga => "saga",
            Column::Series => "series",
            Column::SeriesIndex => "seriesIndex",
        }
    }

    pub fn from_header(raw: &str) -> Option<Column> {
        let normalized = normalize_header(raw);
        Column::ALL
            .into_iter()
            .find(|column| column.aliases().contains(&normalized.as_str()))
    }
}

/// Lowercases `raw` and keeps only ASCII letters and digits.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        .collect()
}

/// Field positions resolved from a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: usize,
    pub title: usize,
    pub number: Option<usize>,
    pub saga: Option<usize>,
    pub series: Option<usize>,
    pub series_index: Option<usize>,
}

impl ColumnMap {
    /// Validates every header name and locates each field.
    ///
    /// When several headers map to one field, the earliest alias in
    /// [`Column::aliases`] order wins, then the leftmost column.
    pub fn from_header(header: &[String]) -> Result<Self, ImportError> {
        let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

        for (raw, norm) in header.iter().zip(&normalized) {
            let known = Column::ALL
                .into_iter()
                .any(|column| column.aliases().contains(&norm.as_str()));
            if !known {
                return Err(ImportError::UnknownColumn(raw.clone()));
            }
        }

        let find = |column: Column| {
            column
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
        };

        let (Some(id), Some(title)) = (find(Column::Id), find(Column::Title)) else {
            return Err(ImportError::MissingRequiredColumns);
        };

        Ok(Self {
            id,
            title,
            number: find(Column::Number),
            saga: find(Column::Saga),
            series: find(Column::Series),
            series_index: find(Column::SeriesIndex),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn normalization_drops_case_space_and_punctuation() {
        assert_eq!(normalize_header("  Book ID "), "bookid");
        assert_eq!(normalize_header("series_idx"), "seriesidx");
        assert_eq!(normalize_header("Series-No."), "seriesno");
        assert_eq!(normalize_header("Númber"), "nmber");
    }

    #[test]
    fn synonyms_resolve_to_columns() {
        assert_eq!(Column::from_header("Book No"), Some(Column::Number));
        assert_eq!(Column::from_header("series_idx"), Some(Column::SeriesIndex));
        assert_eq!(Column::from_header("IDX"), Some(Column::SeriesIndex));
        assert_eq!(Column::from_header("Name"), Some(Column::Title));
        assert_eq!(Column::from_header("author"), None);
    }

    #[test]
    fn maps_required_and_optional_positions() -> anyhow::Result<()> {
        let map = ColumnMap::from_header(&header(&["Title", "Saga", "Book ID", "No"]))?;
        assert_eq!(
            map,
            ColumnMap {
                id: 2,
                title: 0,
                number: Some(3),
                saga: Some(1),
                series: None,
                series_index: None,
            }
        );
        Ok(())
    }

    #[test]
    fn earlier_alias_wins_over_earlier_column() -> anyhow::Result<()> {
        let map = ColumnMap::from_header(&header(&["bookid", "id", "name", "title"]))?;
        assert_eq!(map.id, 1);
        assert_eq!(map.title, 3);
        Ok(())
    }

    #[test]
    fn unknown_column_reports_raw_header() {
        assert_eq!(
            ColumnMap::from_header(&header(&["id", "title", "Author Name"])),
            Err(ImportError::UnknownColumn("Author Name".to_owned()))
        );
        assert_eq!(
            ColumnMap::from_header(&header(&["id", "title", ""])),
            Err(ImportError::UnknownColumn(String::new()))
        );
    }

    #[test]
    fn id_and_title_are_required() {
        assert_eq!(
            ColumnMap::from_header(&header(&["id", "number"])),
            Err(ImportError::MissingRequiredColumns)
        );
        assert_eq!(
            ColumnMap::from_header(&header(&["name", "saga"])),
            Err(ImportError::MissingRequiredColumns)
        );
    }
}
