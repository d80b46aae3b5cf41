#![forbid(unsafe_code)]

pub mod achievements;
pub mod books_json;
pub mod catalog;
pub mod cli;
pub mod csv;
pub mod export;
pub mod formats;
pub mod import;
pub mod list;
pub mod logging;
pub mod state;
pub mod stats;
pub mod store;
