//! Typed view-models: what the UI shows, decoupled from the wire format.

use crate::app_core::geometry::CellIndex;
use crate::model::{CellDetail, DashboardSummary, HotCell};

/// One row of the hotspot list.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotRow {
    pub cell: CellIndex,
    pub count: u64,
    pub label: String,
}

impl HotspotRow {
    pub fn from_hot_cell(hot: &HotCell) -> Self {
        Self {
            cell: CellIndex::new(hot.x, hot.y),
            count: hot.count,
            label: format!("({},{}) — {}", hot.x, hot.y, hot.count),
        }
    }
}

/// Summary panel contents.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub total_moves: String,
    /// One decimal place.
    pub avg_dwell: String,
    pub hotspots: Vec<HotspotRow>,
}

impl DashboardView {
    pub fn from_summary(summary: &DashboardSummary) -> Self {
        Self {
            total_moves: summary.total_moves.to_string(),
            avg_dwell: format!("{:.1}", summary.avg_dwell),
            hotspots: summary.top5.iter().map(HotspotRow::from_hot_cell).collect(),
        }
    }
}

/// Cell modal contents apart from the chart, which lives in its own handle.
#[derive(Debug, Clone, PartialEq)]
pub struct CellDetailView {
    pub cell: CellIndex,
    pub title: String,
    pub snapshots: Vec<String>,
    pub sample_count: usize,
}

impl CellDetailView {
    pub fn from_detail(cell: CellIndex, detail: &CellDetail) -> Self {
        Self {
            cell,
            title: cell_title(cell),
            snapshots: detail.snaps.clone(),
            sample_count: detail.series.len(),
        }
    }
}

pub fn cell_title(cell: CellIndex) -> String {
    format!("Cell {} visit history", cell)
}
