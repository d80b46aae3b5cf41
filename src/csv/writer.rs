use super::delimiter::CANDIDATES;
use crate::formats::BookRecord;

const HEADER: [&str; 6] = ["id", "title", "number", "saga", "series", "seriesIndex"];

/// Serializes books as comma-separated text.
///
/// Importing the output gives back the same records, except that a book
/// with a `number` but no `series_index` comes back with `series_index`
/// equal to `number`: a blank seriesIndex cell always falls back.
pub fn write_books_csv(books: &[BookRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|name| (*name).to_owned()));
    for book in books {
        push_row(
            &mut out,
            [
                book.id.clone(),
                book.title.clone(),
                format_number(book.number),
                book.saga.clone(),
                book.series.clone(),
                format_number(book.series_index),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(&field));
    }
    out.push('\n');
}

fn quote(field: &str) -> String {
    // Any candidate separator is quoted so detection on re-import sees commas.
    let needs_quotes = field.contains(CANDIDATES)
        || field.contains(['"', '\r', '\n'])
        || field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => (value as i64).to_string(),
        Some(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::csv_to_books;

    fn book(id: &str, title: &str, number: Option<f64>, series_index: Option<f64>) -> BookRecord {
        BookRecord {
            id: id.to_owned(),
            number,
            title: title.to_owned(),
            saga: "Tom and Elenna".to_owned(),
            series: "The Golden Armour".to_owned(),
            series_index,
        }
    }

    #[test]
    fn writes_header_and_quotes_when_needed() {
        let csv = write_books_csv(&[book("S02-07", "Zepha, \"the\" Squid", Some(7.0), Some(1.0))]);
        assert_eq!(
            csv,
            "id,title,number,saga,series,seriesIndex\n\
             S02-07,\"Zepha, \"\"the\"\" Squid\",7,Tom and Elenna,The Golden Armour,1\n"
        );
    }

    #[test]
    fn fractional_and_missing_numbers() {
        assert_eq!(format_number(Some(2.5)), "2.5");
        assert_eq!(format_number(Some(-3.0)), "-3");
        assert_eq!(format_number(None), "");
    }

    #[test]
    fn reimporting_written_csv_gives_the_same_books() -> anyhow::Result<()> {
        let original = csv_to_books(
            "Book ID;Name;No;Saga;Series;Series Index\n\
             S01-01;Ferno;1;Tom and Elenna;Where It All Began;\n\
             S01-02;\"Sepron; the Sea Serpent\";2;Tom and Elenna;Where It All Began;2\n\
             X-1;Extra;;;;4.5\n",
        )?;
        let again = csv_to_books(&write_books_csv(&original))?;
        assert_eq!(again, original);
        Ok(())
    }

    #[test]
    fn other_separators_in_fields_do_not_change_detection() -> anyhow::Result<()> {
        let original = vec![
            book("A", "x;x;x;x;x;x;x;x;x;x;x;x", Some(1.0), Some(1.0)),
            book("B", "Tab\tseparated\ttitle\there", Some(2.0), Some(2.0)),
            book("C", "Pipe | pipe | pipe | pipe", Some(3.0), Some(3.0)),
            book("D", "Two\nlines", Some(4.0), Some(4.0)),
            book("E", "Carriage\r\nreturn", None, None),
        ];
        let csv = write_books_csv(&original);
        assert_eq!(crate::csv::detect_delimiter(&csv), ',');
        assert_eq!(csv_to_books(&csv)?, original);
        Ok(())
    }

    #[test]
    fn missing_series_index_comes_back_as_number() -> anyhow::Result<()> {
        let imported = csv_to_books("id,title,number,seriesIndex\nA,T,3,abc\n")?;
        assert_eq!(imported[0].series_index, None);

        let again = csv_to_books(&write_books_csv(&imported))?;
        assert_eq!(again[0].number, Some(3.0));
        assert_eq!(again[0].series_index, Some(3.0));
        Ok(())
    }
}
