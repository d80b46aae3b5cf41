//! Lenient import of a JSON book list, as produced by `export books`.

use anyhow::Context as _;
use serde_json::Value;

use crate::csv::parse_finite;
use crate::formats::BookRecord;

/// Parses a JSON array of book objects.
///
/// Entries without an id or title are skipped rather than rejected. Numbers
/// may be given as JSON numbers or numeric strings; zero and unparseable
/// values count as absent. `seriesIndex` falls back to `number`.
pub fn books_from_json(text: &str) -> anyhow::Result<Vec<BookRecord>> {
    let parsed: Value = serde_json::from_str(text).context("parse books json")?;
    let Value::Array(entries) = parsed else {
        anyhow::bail!("Books JSON must be an array");
    };

    let total = entries.len();
    let books: Vec<BookRecord> = entries.iter().filter_map(normalize_entry).collect();
    if books.is_empty() {
        anyhow::bail!("No valid books after parsing");
    }
    if books.len() < total {
        tracing::warn!(
            skipped = total - books.len(),
            kept = books.len(),
            "skipped json entries without id or title"
        );
    }

    Ok(books)
}

fn normalize_entry(entry: &Value) -> Option<BookRecord> {
    let id = text_field(entry.get("id"));
    let title = text_field(entry.get("title"));
    if id.is_empty() || title.is_empty() {
        return None;
    }

    let number = number_field(entry.get("number"));
    let series_index = match entry.get("seriesIndex") {
        Some(value) if !value.is_null() => number_field(Some(value)),
        _ => number,
    };

    Some(BookRecord {
        id,
        number,
        title,
        saga: text_field(entry.get("saga")),
        series: text_field(entry.get("series")),
        series_index,
    })
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_finite(text),
        Value::Bool(true) => Some(1.0),
        _ => None,
    }?;
    (number != 0.0 && number.is_finite()).then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_valid_entries_and_coerces_numbers() -> anyhow::Result<()> {
        let books = books_from_json(
            r#"[
                {"id": "S01-01", "number": 1, "title": " Ferno ", "saga": "Tom and Elenna", "series": "Where It All Began"},
                {"id": 7, "number": "7", "title": "Zepha", "seriesIndex": "1"},
                {"id": "S01-03", "title": ""},
                {"title": "No id"}
            ]"#,
        )?;

        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "Ferno");
        assert_eq!(books[0].series_index, Some(1.0));
        assert_eq!(books[1].id, "7");
        assert_eq!(books[1].number, Some(7.0));
        assert_eq!(books[1].series_index, Some(1.0));
        assert_eq!(books[1].saga, "");
        Ok(())
    }

    #[test]
    fn zero_numbers_are_absent() -> anyhow::Result<()> {
        let books = books_from_json(r#"[{"id": "A", "title": "B", "number": 0}]"#)?;
        assert_eq!(books[0].number, None);
        assert_eq!(books[0].series_index, None);
        Ok(())
    }

    #[test]
    fn rejects_non_arrays_and_empty_results() {
        let err = books_from_json(r#"{"id": "A"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Books JSON must be an array");

        let err = books_from_json(r#"[{"id": "A"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "No valid books after parsing");

        assert!(books_from_json("not json").is_err());
    }
}
