//! Greedy shortest-track placement.
//!
//! Blocks are visited in declared order and each one goes to the track with
//! the smallest accumulated primary extent, lowest index first on ties. The
//! result depends only on the input, so identical input always yields
//! identical placements.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;
use waterfall_core::{ConfigError, LayoutConfig, Line, Rect};

use crate::registry::Block;

/// Where one block goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub rect: Rect,
    /// Index of the assigned track, `0..line_count`
    pub track: usize,
}

/// Result of one allocation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// Placements keyed by block order, in visitation order
    pub placements: IndexMap<i64, Placement>,
    /// Container height for vertical tracks, width for horizontal ones
    pub total_primary_extent: f64,
    /// Cross-axis size of every track
    pub track_cross_size: f64,
    /// Filled primary extent of each track, without trailing gutter
    pub track_extents: Vec<f64>,
    /// Blocks left unplaced because their primary extent is unknown
    pub skipped: Vec<i64>,
}

impl Layout {
    pub fn get(&self, order: i64) -> Option<&Placement> {
        self.placements.get(&order)
    }

    /// Bounding box of every placement.
    pub fn bounds(&self) -> Option<Rect> {
        self.placements
            .values()
            .map(|p| p.rect.clone())
            .reduce(|acc, rect| acc.union(&rect))
    }
}

/// Per-track state while a pass runs.
#[derive(Debug, Clone, Copy, Default)]
struct Track {
    /// Next free primary offset, gutter included
    cursor: f64,
    blocks: usize,
}

/// Place `blocks` on `config.line_count` tracks inside a container whose
/// cross-axis extent is `container_cross_extent`.
///
/// Blocks are visited by ascending `order` whatever the slice order is.
/// Blocks with a zero, negative or non-finite primary extent are skipped and
/// listed in [`Layout::skipped`]. Orders are expected to be unique, as a
/// [`BlockRegistry`](crate::BlockRegistry) guarantees; for a repeated order
/// only the first block in the slice is considered. A configuration that
/// cannot produce a positive track size is an error and nothing is placed.
pub fn allocate<N>(
    blocks: &[Block<N>],
    config: &LayoutConfig,
    container_cross_extent: f64,
) -> Result<Layout, ConfigError> {
    let track_cross_size = config.track_cross_size(container_cross_extent)?;
    let gutter = config.gutter;
    let occupied = config.occupied_cross_extent(track_cross_size);
    let align_offset = config.align.offset(container_cross_extent, occupied);

    let mut tracks: SmallVec<[Track; 8]> = SmallVec::from_elem(Track::default(), config.line_count);

    let mut visit: Vec<&Block<N>> = blocks.iter().collect();
    visit.sort_by_key(|b| b.order);

    let mut layout = Layout {
        track_cross_size,
        ..Default::default()
    };

    let mut previous: Option<i64> = None;
    for block in visit {
        if previous.replace(block.order) == Some(block.order) {
            trace!(order = block.order, "duplicate order, ignoring block");
            continue;
        }

        let extent = config.line.primary(block.size());
        if !extent.is_finite() || extent <= 0.0 {
            trace!(order = block.order, "block has no usable measurement, skipping");
            layout.skipped.push(block.order);
            continue;
        }

        let index = shortest_track(&tracks);
        let track = &mut tracks[index];
        let primary = track.cursor;
        let cross = align_offset + index as f64 * (track_cross_size + gutter);

        let rect = match config.line {
            Line::V => Rect::new(cross, primary, track_cross_size, extent),
            Line::H => Rect::new(primary, cross, extent, track_cross_size),
        };

        track.cursor += extent + gutter;
        track.blocks += 1;
        layout.placements.insert(block.order, Placement { rect, track: index });
    }

    layout.track_extents = tracks
        .iter()
        .map(|t| if t.blocks > 0 { t.cursor - gutter } else { 0.0 })
        .collect();
    layout.total_primary_extent = layout.track_extents.iter().copied().fold(0.0, f64::max);

    Ok(layout)
}

/// Index of the track with the smallest cursor, lowest index on ties.
fn shortest_track(tracks: &[Track]) -> usize {
    let mut best = 0;
    for (index, track) in tracks.iter().enumerate().skip(1) {
        if track.cursor < tracks[best].cursor {
            best = index;
        }
    }
    best
}
