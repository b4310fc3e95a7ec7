//! Track allocation for waterfall layouts.
//!
//! This crate holds the ordered set of managed blocks and the placement
//! algorithm that distributes them over parallel tracks.
//!
//! # Architecture
//!
//! 1. **Registry**: blocks keyed by their declared order, with copy-on-read snapshots
//! 2. **Allocation**: greedy shortest-track placement in declared order
//! 3. **Commit**: whole-geometry swaps back into the registry
//!
//! # Example
//!
//! ```
//! use waterfall_core::LayoutConfig;
//! use waterfall_layout::{allocate, Block, BlockRegistry};
//!
//! let mut registry = BlockRegistry::new();
//! registry.register(Block::new(0, ()).with_size(100.0, 100.0)).unwrap();
//! registry.register(Block::new(1, ()).with_size(100.0, 50.0)).unwrap();
//!
//! let layout = allocate(&registry.snapshot(), &LayoutConfig::columns(2), 200.0).unwrap();
//! registry.commit(&layout);
//!
//! assert_eq!(layout.total_primary_extent, 100.0);
//! assert_eq!(registry.get(1).unwrap().rect.as_ref().unwrap().left, 100.0);
//! ```

mod allocator;
mod registry;

pub use allocator::{allocate, Layout, Placement};
pub use registry::{Block, BlockPatch, BlockRegistry};
