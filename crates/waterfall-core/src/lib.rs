//! Core types, errors, and element helpers for the waterfall layout engine.
//!
//! This crate provides the foundational types shared by the other waterfall crates:
//! - Layout configuration (track count, orientation, alignment, gutter)
//! - Geometry (`Rect`, `Size`) with a typed extension map for consumer annotations
//! - Correlation tokens threaded through reflow requests
//! - Error types
//! - Element helpers used to toggle transition-marker classes

pub mod element;
pub mod errors;
pub mod geometry;
pub mod types;

pub use element::Element;
pub use errors::*;
pub use geometry::*;
pub use types::*;
