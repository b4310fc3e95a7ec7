//! Error types for the waterfall engine.
//!
//! Only configuration problems are errors. A block without a usable
//! measurement is skipped and retried on the next pass, and a completion
//! token nobody waits for is ignored.

use thiserror::Error;

/// Top-level error type for the waterfall engine.
#[derive(Debug, Error)]
pub enum WaterfallError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Reflow(#[from] ReflowError),
}

/// A malformed layout configuration. Fatal to a single reflow pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid line count {line_count}: at least one track is required")]
    InvalidLineCount { line_count: usize },

    #[error("Invalid gutter {gutter}: must be a finite, non-negative number")]
    NegativeGutter { gutter: f64 },

    #[error("Invalid container extent {extent}")]
    InvalidContainerExtent { extent: f64 },

    #[error("Track size {track_size} is not positive: {line_count} tracks do not fit in {container}")]
    NonPositiveTrackSize {
        line_count: usize,
        container: f64,
        track_size: f64,
    },
}

/// Errors while managing the block registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A block with order {order} is already registered")]
    DuplicateOrder { order: i64 },
}

/// Errors surfaced by a reflow pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReflowError {
    #[error("Reflow aborted: {0}")]
    Config(#[from] ConfigError),
}
