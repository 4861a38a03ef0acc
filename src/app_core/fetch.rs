//! Runtime-agnostic request and response messages.
//!
//! The reducer never talks to the network. It records an [`AppAction`]
//! (see `state`), the runtime turns that into one or more [`FetchRequest`]s,
//! and whatever comes back is fed to `reducer::apply_response` as a
//! [`FetchResponse`].
//!
//! [`AppAction`]: crate::app_core::state::AppAction

use crate::app_core::geometry::CellIndex;
use crate::error::DashboardError;
use crate::model::{CellDetail, DashboardSummary, VideoEntry};

/// Work for the fetcher. Each request runs independently; completion order is
/// not guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Dashboard { video_id: u64 },
    Heatmap {
        video_id: u64,
        ticket: u64,
    },
    Cell {
        video_id: u64,
        cell: CellIndex,
        ticket: u64,
    },
    /// One snapshot image for the open cell modal, tagged with its ticket.
    Snapshot {
        video_id: u64,
        ticket: u64,
        url: String,
    },
    Videos,
}

#[derive(Debug)]
pub enum FetchResponse {
    Dashboard {
        video_id: u64,
        result: Result<DashboardSummary, DashboardError>,
    },
    /// Encoded image bytes, decoded on the UI side.
    Heatmap {
        video_id: u64,
        ticket: u64,
        result: Result<Vec<u8>, DashboardError>,
    },
    Cell {
        video_id: u64,
        cell: CellIndex,
        ticket: u64,
        result: Result<CellDetail, DashboardError>,
    },
    Snapshot {
        video_id: u64,
        ticket: u64,
        url: String,
        result: Result<Vec<u8>, DashboardError>,
    },
    Videos {
        result: Result<Vec<VideoEntry>, DashboardError>,
    },
}

impl FetchRequest {
    /// Short label used in log lines and thread names.
    pub fn label(&self) -> String {
        match self {
            FetchRequest::Dashboard { video_id } => format!("dashboard-{}", video_id),
            FetchRequest::Heatmap { video_id, ticket } => {
                format!("heatmap-{}-{}", video_id, ticket)
            }
            FetchRequest::Cell {
                video_id, cell, ..
            } => format!("cell-{}-{}-{}", video_id, cell.gx, cell.gy),
            FetchRequest::Snapshot {
                video_id, ticket, ..
            } => format!("snapshot-{}-{}", video_id, ticket),
            FetchRequest::Videos => "videos".to_string(),
        }
    }
}
