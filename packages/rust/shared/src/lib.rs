//! Shared types, error model, and configuration for scorepull.
//!
//! This crate is the foundation depended on by all other scorepull crates.
//! It provides:
//! - [`ScorePullError`]: the unified error type
//! - Domain types ([`PageRequest`], [`ScoreRecord`], [`PageContent`], row layout)
//! - The upstream response envelope ([`ScoreEnvelope`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RunConfig, RunDefaults, SourceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, output_file_name, render_config,
};
pub use error::{Result, ScorePullError};
pub use types::{
    COLUMN_TITLES, DEFAULT_PAGE_SIZE, HEADER_ROWS, PageContent, PageRequest, ScoreEntry,
    ScoreEnvelope, ScoreRecord, row_offset,
};
