//! Sparkify ETL
//!
//! Loads synthetic music-streaming fixtures into a SQLite star schema and
//! runs a few read-only reports over it. Each stage has its own binary; this
//! library holds everything they share.

pub mod cli_style;
pub mod config;
pub mod error;
pub mod etl;
pub mod generator;
pub mod logging;
pub mod reporting;
pub mod sqlite_persistence;
pub mod warehouse;

pub use config::{AppConfig, CommonArgs, DatabaseConfig};
pub use error::{EtlError, EtlResult};
pub use warehouse::Warehouse;
