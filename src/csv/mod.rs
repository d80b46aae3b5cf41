//! CSV book import: delimiter sniffing, tokenizing, header validation and
//! row normalization into [`BookRecord`]s.
//!
//! Everything here is pure. Callers read the text, pick options, and either
//! receive every record or a description of what was wrong; a failed import
//! never yields a partial list.

mod delimiter;
mod error;
mod number;
mod schema;
mod tokenizer;
pub mod writer;

pub use delimiter::{CANDIDATES, delimiter_name, detect_delimiter, parse_delimiter};
pub use error::{ImportError, ImportErrors};
pub use number::parse_finite;
pub use schema::{Column, ColumnMap, normalize_header};
pub use tokenizer::tokenize;
pub use writer::write_books_csv;

use crate::formats::BookRecord;

/// How row-level failures are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Stop at the first invalid row.
    #[default]
    FailFast,
    /// Check every data row and report all failures together.
    CollectAll,
}

/// Treatment of numeric cells that do not parse to a finite number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberPolicy {
    /// Treat the value as absent.
    #[default]
    Lenient,
    /// Reject the row with [`ImportError::InvalidNumber`].
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Field separator; detected from the text when `None`.
    pub delimiter: Option<char>,
    pub error_mode: ErrorMode,
    pub numbers: NumberPolicy,
}

/// Imports books from CSV text, stopping at the first problem.
///
/// `options.error_mode` is ignored; use [`import_books_collecting`] to
/// gather every row failure.
pub fn import_books(text: &str, options: &ImportOptions) -> Result<Vec<BookRecord>, ImportError> {
    let options = ImportOptions {
        error_mode: ErrorMode::FailFast,
        ..*options
    };
    import(text, &options)
        .map_err(|errors| errors.into_first().unwrap_or(ImportError::NoValidRows))
}

/// Imports books from CSV text, honoring `options.error_mode`.
pub fn import_books_collecting(
    text: &str,
    options: &ImportOptions,
) -> Result<Vec<BookRecord>, ImportErrors> {
    import(text, options)
}

/// Imports with delimiter detection and default options.
pub fn csv_to_books(text: &str) -> Result<Vec<BookRecord>, ImportError> {
    import_books(text, &ImportOptions::default())
}

fn import(text: &str, options: &ImportOptions) -> Result<Vec<BookRecord>, ImportErrors> {
    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(text));
    let mut rows = tokenize(text, delimiter).into_iter();
    tracing::debug!(delimiter = ?delimiter, "tokenized csv");

    let header = rows.next().ok_or(ImportError::EmptyInput)?;
    if header.is_empty() {
        return Err(ImportError::EmptyHeader.into());
    }
    let data: Vec<Vec<String>> = rows.collect();

    let collect = options.error_mode == ErrorMode::CollectAll;
    let mut errors = Vec::new();

    for (i, row) in data.iter().enumerate() {
        if row.len() != header.len() {
            errors.push(ImportError::RowWidthMismatch {
                row: i + 2,
                actual: row.len(),
                expected: header.len(),
            });
            if !collect {
                break;
            }
        }
    }
    if !errors.is_empty() {
        return Err(ImportErrors(errors));
    }

    let columns = ColumnMap::from_header(&header)?;

    let mut books = Vec::with_capacity(data.len());
    for (i, row) in data.iter().enumerate() {
        match normalize_row(row, i + 2, &columns, options.numbers) {
            Ok(book) => books.push(book),
            Err(row_errors) => {
                errors.extend(row_errors);
                if !collect {
                    break;
                }
            }
        }
    }
    if !errors.is_empty() {
        if !collect {
            errors.truncate(1);
        }
        return Err(ImportErrors(errors));
    }

    if books.is_empty() {
        return Err(ImportError::NoValidRows.into());
    }

    tracing::debug!(books = books.len(), "normalized csv rows");
    Ok(books)
}

fn normalize_row(
    row: &[String],
    row_number: usize,
    columns: &ColumnMap,
    numbers: NumberPolicy,
) -> Result<BookRecord, Vec<ImportError>> {
    let cell = move |index: Option<usize>| {
        index
            .and_then(|i| row.get(i))
            .map_or("", |value| value.trim())
    };

    let mut errors = Vec::new();

    let id = cell(Some(columns.id));
    let title = cell(Some(columns.title));
    if id.is_empty() {
        errors.push(ImportError::EmptyId { row: row_number });
    }
    if title.is_empty() {
        errors.push(ImportError::EmptyTitle { row: row_number });
    }

    let mut numeric = |column: Column, index: Option<usize>| {
        let text = cell(index);
        if text.is_empty() {
            return None;
        }
        let parsed = parse_finite(text);
        if parsed.is_none() {
            match numbers {
                NumberPolicy::Lenient => tracing::trace!(
                    row = row_number,
                    column = column.name(),
                    value = text,
                    "discarding non-numeric value"
                ),
                NumberPolicy::Strict => errors.push(ImportError::InvalidNumber {
                    row: row_number,
                    column: column.name(),
                    value: text.to_owned(),
                }),
            }
        }
        parsed
    };

    let number = numeric(Column::Number, columns.number);
    let series_index = if cell(columns.series_index).is_empty() {
        number
    } else {
        numeric(Column::SeriesIndex, columns.series_index)
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookRecord {
        id: id.to_owned(),
        number,
        title: title.to_owned(),
        saga: cell(columns.saga).to_owned(),
        series: cell(columns.series).to_owned(),
        series_index,
    })
}
