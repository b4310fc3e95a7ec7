//! TypeScript-friendly shapes returned to JavaScript.

use serde::{Deserialize, Serialize};
use waterfall_layout::BlockRegistry;
use waterfall_reflow::FlushReport;

/// Placement of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementJs {
    pub order: i64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Summary of a `flush` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushJs {
    pub runs: usize,
    pub total_extent: Option<f64>,
    pub tokens: Vec<String>,
    pub skipped: Vec<i64>,
}

impl From<&FlushReport> for FlushJs {
    fn from(report: &FlushReport) -> Self {
        Self {
            runs: report.runs(),
            total_extent: report.total_extent(),
            tokens: report.tokens().map(|t| t.to_string()).collect(),
            skipped: report
                .passes
                .last()
                .map(|p| p.skipped.clone())
                .unwrap_or_default(),
        }
    }
}

/// Placements of every placed block, ascending by order.
pub fn placements_of<N>(registry: &BlockRegistry<N>) -> Vec<PlacementJs> {
    registry
        .iter()
        .filter_map(|block| {
            let rect = block.rect.as_ref()?;
            Some(PlacementJs {
                order: block.order,
                left: rect.left,
                top: rect.top,
                width: rect.width,
                height: rect.height,
            })
        })
        .collect()
}
