use thiserror::Error;

/// Reasons a CSV book import is rejected.
///
/// Row numbers are 1-based and count the header as row 1, so the first
/// data row is row 2.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("CSV is empty")]
    EmptyInput,

    #[error("Header row is empty")]
    EmptyHeader,

    #[error("Row {row} has {actual} columns; expected {expected}")]
    RowWidthMismatch {
        row: usize,
        actual: usize,
        expected: usize,
    },

    #[error("Unknown column: \"{0}\"")]
    UnknownColumn(String),

    #[error("CSV must include columns: id, title")]
    MissingRequiredColumns,

    #[error("Row {row} has empty id")]
    EmptyId { row: usize },

    #[error("Row {row} has empty title")]
    EmptyTitle { row: usize },

    #[error("Row {row} has invalid {column}: \"{value}\"")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("No valid books after parsing")]
    NoValidRows,
}

impl ImportError {
    /// The offending data row, for row-level failures.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::RowWidthMismatch { row, .. }
            | Self::EmptyId { row }
            | Self::EmptyTitle { row }
            | Self::InvalidNumber { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Every failure found by a collecting import, in row order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.0))]
pub struct ImportErrors(pub Vec<ImportError>);

impl ImportErrors {
    pub fn errors(&self) -> &[ImportError] {
        &self.0
    }

    pub fn into_first(self) -> Option<ImportError> {
        self.0.into_iter().next()
    }
}

impl From<ImportError> for ImportErrors {
    fn from(err: ImportError) -> Self {
        Self(vec![err])
    }
}

fn render(errors: &[ImportError]) -> String {
    match errors {
        [] => "import failed".to_owned(),
        [only] => only.to_string(),
        many => {
            let lines: Vec<String> = many.iter().map(|err| format!("  {err}")).collect();
            format!("{} problems found:\n{}", many.len(), lines.join("\n"))
        }
    }
}
