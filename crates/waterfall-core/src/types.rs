//! Core value types for layout configuration.

use std::fmt;

use crate::errors::ConfigError;

/// Orientation of the tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Line {
    /// Vertical tracks (columns); the primary axis is height.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "v"))]
    V,
    /// Horizontal tracks (rows); the primary axis is width.
    #[cfg_attr(feature = "serde", serde(rename = "h"))]
    H,
}

impl Line {
    /// Extent of `size` along the primary (stacking) axis.
    pub fn primary(self, size: Size) -> f64 {
        match self {
            Line::V => size.height,
            Line::H => size.width,
        }
    }

    /// Extent of `size` along the cross axis.
    pub fn cross(self, size: Size) -> f64 {
        match self {
            Line::V => size.width,
            Line::H => size.height,
        }
    }
}

/// Justification of the track group on the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

impl Align {
    /// Offset applied to every track when `occupied` is narrower than `available`.
    pub fn offset(self, available: f64, occupied: f64) -> f64 {
        let free = available - occupied;
        match self {
            Align::Left => 0.0,
            Align::Right => free,
            Align::Center => free / 2.0,
        }
    }
}

/// Layout configuration, read fresh for every reflow pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct LayoutConfig {
    /// Number of parallel tracks
    pub line_count: usize,
    /// Track orientation
    pub line: Line,
    /// Cross-axis justification
    pub align: Align,
    /// Spacing between adjacent blocks on both axes
    pub gutter: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_count: 2,
            line: Line::V,
            align: Align::Left,
            gutter: 0.0,
        }
    }
}

impl LayoutConfig {
    /// Vertical tracks (columns).
    pub fn columns(line_count: usize) -> Self {
        Self {
            line_count,
            line: Line::V,
            ..Default::default()
        }
    }

    /// Horizontal tracks (rows).
    pub fn rows(line_count: usize) -> Self {
        Self {
            line_count,
            line: Line::H,
            ..Default::default()
        }
    }

    pub fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count;
        self
    }

    pub fn with_line(mut self, line: Line) -> Self {
        self.line = line;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_gutter(mut self, gutter: f64) -> Self {
        self.gutter = gutter;
        self
    }

    /// Check the parts of the configuration that do not depend on the container.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_count < 1 {
            return Err(ConfigError::InvalidLineCount {
                line_count: self.line_count,
            });
        }
        if !self.gutter.is_finite() || self.gutter < 0.0 {
            return Err(ConfigError::NegativeGutter { gutter: self.gutter });
        }
        Ok(())
    }

    /// Size of one track on the cross axis, floored to whole units.
    pub fn track_cross_size(&self, container_cross_extent: f64) -> Result<f64, ConfigError> {
        self.validate()?;
        if !container_cross_extent.is_finite() {
            return Err(ConfigError::InvalidContainerExtent {
                extent: container_cross_extent,
            });
        }
        let gutters = self.gutter * (self.line_count - 1) as f64;
        let size = ((container_cross_extent - gutters) / self.line_count as f64).floor();
        if size <= 0.0 {
            return Err(ConfigError::NonPositiveTrackSize {
                line_count: self.line_count,
                container: container_cross_extent,
                track_size: size,
            });
        }
        Ok(size)
    }

    /// Cross-axis extent covered by all tracks and the gutters between them.
    pub fn occupied_cross_extent(&self, track_cross_size: f64) -> f64 {
        let n = self.line_count as f64;
        n * track_cross_size + self.gutter * (n - 1.0).max(0.0)
    }
}

/// Width and height of a measured node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Opaque correlation token identifying one logical reflow request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token(s)
    }
}
