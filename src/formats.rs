use serde::{Deserialize, Serialize};

/// A normalized catalog entry.
///
/// `id` and `title` are never empty when produced by the importers; every
/// other field may be blank or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
    pub title: String,
    #[serde(default)]
    pub saga: String,
    #[serde(default)]
    pub series: String,
    #[serde(
        default,
        rename = "seriesIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub series_index: Option<f64>,
}

impl BookRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: None,
            title: title.into(),
            saga: String::new(),
            series: String::new(),
            series_index: None,
        }
    }
}

/// Owned/read flags as exchanged by `export state` and `state import`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub owned: Vec<String>,
    #[serde(default)]
    pub read: Vec<String>,
}
