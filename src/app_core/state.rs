//! Application state and the state-mutation methods the reducer builds on.
//!
//! Nothing here performs I/O. Work that needs the network is expressed as an
//! [`AppAction`] in `pending_action`, which the runtime executes after each
//! event.

use crate::app_core::chart::{CellChart, replace_chart};
use crate::app_core::geometry::{
    CellIndex, CellSize, GridDims, PointerPoint, ViewportRect, map_click_in_bounds,
};
use crate::app_core::heatmap::HeatmapImage;
use crate::app_core::view::{CellDetailView, DashboardView, HotspotRow};
use crate::model::{CellDetail, DashboardSummary, VideoEntry};
use crate::theme::ThemeConfig;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tui_scrollview::ScrollViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Heatmap,
    Hotspots,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Fetch the summary and heatmap for a video.
    LoadVideo { video_id: u64, heatmap_ticket: u64 },
    FetchCell {
        video_id: u64,
        cell: CellIndex,
        ticket: u64,
    },
    /// Fetch the selected snapshot of the modal holding `ticket`.
    FetchSnapshot {
        video_id: u64,
        ticket: u64,
        url: String,
    },
    OpenVideoPicker,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Preview of the selected snapshot in the cell modal.
#[derive(Debug)]
pub enum SnapshotPreview {
    Loading { url: String },
    Ready { url: String, image: HeatmapImage },
    Failed { url: String, error: String },
}

impl SnapshotPreview {
    pub fn url(&self) -> &str {
        match self {
            SnapshotPreview::Loading { url }
            | SnapshotPreview::Ready { url, .. }
            | SnapshotPreview::Failed { url, .. } => url,
        }
    }
}

/// The open cell-detail modal. `detail` is `None` while the request is in
/// flight.
#[derive(Debug)]
pub struct CellModal {
    pub cell: CellIndex,
    pub ticket: u64,
    pub detail: Option<CellDetailView>,
    pub error: Option<String>,
    pub snapshot_state: ListState,
    pub preview: Option<SnapshotPreview>,
}

impl CellModal {
    pub fn is_loading(&self) -> bool {
        self.detail.is_none() && self.error.is_none()
    }
}

pub struct AppState {
    pub theme: ThemeConfig,
    pub app_version: String,
    /// Server URL as shown in the title bar.
    pub server_label: String,
    pub video_id: Option<u64>,
    pub video_name: Option<String>,
    pub cell_size: CellSize,
    pub heatmap: HeatmapImage,
    /// Dashboard summary. Stays `None` if the request failed.
    pub summary: Option<DashboardView>,
    pub hot_cells: foldhash::HashSet<CellIndex>,
    pub hotspot_state: ListState,
    /// Grid cursor in the heatmap pane.
    pub selected_cell: CellIndex,
    pub hovered_cell: Option<CellIndex>,
    pub focused_pane: FocusPane,
    pub dashboard_loading: bool,
    pub heatmap_loading: bool,
    /// Latest ticket issued to a heatmap request.
    pub latest_heatmap_ticket: u64,
    pub cell_modal: Option<CellModal>,
    /// Chart built from the latest cell response, installed on next draw.
    pub pending_chart: Option<CellChart>,
    /// The live chart handle. Only ever swapped via [`replace_chart`].
    pub cell_chart: Option<CellChart>,
    /// Latest ticket issued to a cell request.
    pub latest_cell_ticket: u64,
    pub show_help: bool,
    pub help_scroll: ScrollViewState,
    pub show_video_picker: bool,
    pub video_picker_requested: bool,
    pub video_entries: Vec<VideoEntry>,
    pub video_list_state: ListState,
    pub status: Option<StatusLine>,
    /// Screen region of the heatmap pane (including borders)
    pub heatmap_area: Option<Rect>,
    /// Screen region the image itself occupies, letterbox excluded
    pub image_area: Option<Rect>,
    pub hotspot_area: Option<Rect>,
    pub hotspot_content_area: Option<Rect>,
    pub modal_area: Option<Rect>,
    pub snapshot_content_area: Option<Rect>,
    pub picker_area: Option<Rect>,
    pub picker_content_area: Option<Rect>,
    pub should_quit: bool,
    pub pending_action: Option<AppAction>,
}

impl AppState {
    pub fn new(
        theme: ThemeConfig,
        app_version: String,
        server_label: String,
        cell_size: CellSize,
        natural: (u32, u32),
    ) -> Self {
        Self {
            theme,
            app_version,
            server_label,
            video_id: None,
            video_name: None,
            cell_size,
            heatmap: HeatmapImage::placeholder(natural.0, natural.1, cell_size),
            summary: None,
            hot_cells: foldhash::HashSet::default(),
            hotspot_state: ListState::default(),
            selected_cell: CellIndex::default(),
            hovered_cell: None,
            focused_pane: FocusPane::Heatmap,
            dashboard_loading: false,
            heatmap_loading: false,
            latest_heatmap_ticket: 0,
            cell_modal: None,
            pending_chart: None,
            cell_chart: None,
            latest_cell_ticket: 0,
            show_help: false,
            help_scroll: ScrollViewState::default(),
            show_video_picker: false,
            video_picker_requested: false,
            video_entries: Vec::new(),
            video_list_state: ListState::default(),
            status: None,
            heatmap_area: None,
            image_area: None,
            hotspot_area: None,
            hotspot_content_area: None,
            modal_area: None,
            snapshot_content_area: None,
            picker_area: None,
            picker_content_area: None,
            should_quit: false,
            pending_action: None,
        }
    }

    pub fn grid(&self) -> GridDims {
        GridDims::for_image(self.heatmap.width(), self.heatmap.height(), self.cell_size)
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    /// Switches to (or reloads) `video_id` and asks the runtime to fetch it.
    pub fn select_video(&mut self, video_id: u64) {
        if self.video_id != Some(video_id) {
            self.video_id = Some(video_id);
            self.video_name = self
                .video_entries
                .iter()
                .find(|entry| entry.id == video_id)
                .map(|entry| entry.name.clone());
            self.summary = None;
            self.hot_cells.clear();
            self.hotspot_state.select(None);
            self.hovered_cell = None;
            self.close_cell_modal();
            let (width, height) = (self.heatmap.width(), self.heatmap.height());
            self.heatmap = HeatmapImage::placeholder(width, height, self.cell_size);
        }
        self.dashboard_loading = true;
        self.heatmap_loading = true;
        self.latest_heatmap_ticket += 1;
        self.set_status(format!("Loading video {}", video_id));
        self.pending_action = Some(AppAction::LoadVideo {
            video_id,
            heatmap_ticket: self.latest_heatmap_ticket,
        });
    }

    pub fn apply_summary(&mut self, summary: &DashboardSummary) {
        let view = DashboardView::from_summary(summary);
        self.hot_cells = view.hotspots.iter().map(|row| row.cell).collect();
        self.hotspot_state
            .select(if view.hotspots.is_empty() { None } else { Some(0) });
        self.summary = Some(view);
        self.dashboard_loading = false;
    }

    /// Installs a new heatmap and keeps the cursor on the grid.
    pub fn set_heatmap(&mut self, heatmap: HeatmapImage) {
        self.heatmap = heatmap;
        self.heatmap_loading = false;
        self.selected_cell = self.grid().clamp(self.selected_cell);
        self.hovered_cell = None;
    }

    pub fn hotspots(&self) -> &[HotspotRow] {
        self.summary
            .as_ref()
            .map(|view| view.hotspots.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_hotspot(&self) -> Option<&HotspotRow> {
        self.hotspot_state
            .selected()
            .and_then(|idx| self.hotspots().get(idx))
    }

    /// Moves the hotspot selection by `direction` (+1 or -1).
    pub fn move_hotspot_selection(&mut self, direction: i32) {
        let len = self.hotspots().len();
        if len == 0 {
            self.hotspot_state.select(None);
            return;
        }
        let current = self.hotspot_state.selected().unwrap_or(0);
        let next = if direction < 0 {
            current.saturating_sub(1)
        } else {
            (current + 1).min(len - 1)
        };
        self.hotspot_state.select(Some(next));
    }

    /// Moves the grid cursor, clamped to the grid.
    pub fn move_cursor(&mut self, dx: i64, dy: i64) {
        self.selected_cell = self.grid().clamp(self.selected_cell.offset(dx, dy));
    }

    /// Cell under a terminal position inside the rendered image, if any.
    pub fn cell_at(&self, column: u16, row: u16) -> Option<CellIndex> {
        let area = self.image_area?;
        let cell = map_click_in_bounds(
            PointerPoint::cell_center(column, row),
            ViewportRect::from(area),
            self.heatmap.natural_size(),
            self.cell_size,
        )?;
        self.grid().contains(cell).then_some(cell)
    }

    /// Shows the modal in its loading state and requests the cell's history.
    pub fn open_cell(&mut self, cell: CellIndex) {
        let Some(video_id) = self.video_id else {
            self.set_error("No video selected");
            return;
        };
        self.latest_cell_ticket += 1;
        let ticket = self.latest_cell_ticket;
        self.selected_cell = cell;
        self.cell_modal = Some(CellModal {
            cell,
            ticket,
            detail: None,
            error: None,
            snapshot_state: ListState::default(),
            preview: None,
        });
        self.pending_action = Some(AppAction::FetchCell {
            video_id,
            cell,
            ticket,
        });
    }

    pub fn close_cell_modal(&mut self) {
        self.cell_modal = None;
        self.modal_area = None;
        self.snapshot_content_area = None;
        self.pending_chart = None;
    }

    /// Fills the open modal if `ticket` is still the one it waits for.
    /// Returns `false` for stale responses.
    pub fn apply_cell_detail(&mut self, cell: CellIndex, ticket: u64, detail: &CellDetail) -> bool {
        if ticket != self.latest_cell_ticket {
            return false;
        }
        let Some(modal) = self.cell_modal.as_mut() else {
            return false;
        };
        if modal.ticket != ticket {
            return false;
        }
        let view = CellDetailView::from_detail(cell, detail);
        modal
            .snapshot_state
            .select(if view.snapshots.is_empty() { None } else { Some(0) });
        modal.detail = Some(view);
        modal.error = None;
        self.pending_chart = Some(CellChart::new(cell, &detail.series));
        self.request_snapshot_preview();
        true
    }

    /// Swaps in the chart built by the last cell response. Called right
    /// before the modal is drawn.
    pub fn install_pending_chart(&mut self) {
        if let Some(next) = self.pending_chart.take() {
            self.cell_chart = Some(replace_chart(self.cell_chart.take(), next));
        }
    }

    /// The chart for the open modal, if it matches the modal's cell.
    pub fn current_chart(&self) -> Option<&CellChart> {
        let modal = self.cell_modal.as_ref()?;
        self.cell_chart
            .as_ref()
            .filter(|chart| chart.cell() == modal.cell && modal.detail.is_some())
    }

    pub fn move_snapshot_selection(&mut self, direction: i32) {
        let Some(modal) = self.cell_modal.as_mut() else {
            return;
        };
        let len = modal
            .detail
            .as_ref()
            .map(|detail| detail.snapshots.len())
            .unwrap_or(0);
        if len == 0 {
            return;
        }
        let current = modal.snapshot_state.selected().unwrap_or(0);
        let next = if direction < 0 {
            current.saturating_sub(1)
        } else {
            (current + 1).min(len - 1)
        };
        modal.snapshot_state.select(Some(next));
        self.request_snapshot_preview();
    }

    /// Selects snapshot `index` in the open modal, if it exists.
    pub fn select_snapshot(&mut self, index: usize) -> bool {
        let Some(modal) = self.cell_modal.as_mut() else {
            return false;
        };
        let len = modal
            .detail
            .as_ref()
            .map(|detail| detail.snapshots.len())
            .unwrap_or(0);
        if index >= len {
            return false;
        }
        modal.snapshot_state.select(Some(index));
        self.request_snapshot_preview();
        true
    }

    /// Asks for the selected snapshot unless it is already shown or loading.
    pub fn request_snapshot_preview(&mut self) {
        let Some(video_id) = self.video_id else {
            return;
        };
        let Some(url) = self.selected_snapshot().map(str::to_string) else {
            return;
        };
        let Some(modal) = self.cell_modal.as_mut() else {
            return;
        };
        if let Some(preview) = &modal.preview
            && preview.url() == url
            && !matches!(preview, SnapshotPreview::Failed { .. })
        {
            return;
        }
        modal.preview = Some(SnapshotPreview::Loading { url: url.clone() });
        self.pending_action = Some(AppAction::FetchSnapshot {
            video_id,
            ticket: modal.ticket,
            url,
        });
    }

    /// Installs a fetched snapshot if the modal still waits for `url`.
    /// Returns `false` for stale responses.
    pub fn apply_snapshot(
        &mut self,
        ticket: u64,
        url: &str,
        result: Result<HeatmapImage, String>,
    ) -> bool {
        let Some(modal) = self.cell_modal.as_mut() else {
            return false;
        };
        let waiting = matches!(
            &modal.preview,
            Some(SnapshotPreview::Loading { url: pending }) if pending == url
        );
        if modal.ticket != ticket || !waiting {
            return false;
        }
        let url = url.to_string();
        modal.preview = Some(match result {
            Ok(image) => SnapshotPreview::Ready { url, image },
            Err(error) => SnapshotPreview::Failed { url, error },
        });
        true
    }

    pub fn selected_snapshot(&self) -> Option<&str> {
        let modal = self.cell_modal.as_ref()?;
        let detail = modal.detail.as_ref()?;
        modal
            .snapshot_state
            .selected()
            .and_then(|idx| detail.snapshots.get(idx))
            .map(String::as_str)
    }

    pub fn open_video_picker(&mut self, entries: Vec<VideoEntry>) {
        let selected = self
            .video_id
            .and_then(|id| entries.iter().position(|entry| entry.id == id))
            .unwrap_or(0);
        self.video_list_state
            .select(if entries.is_empty() { None } else { Some(selected) });
        self.video_entries = entries;
        self.show_video_picker = true;
    }

    pub fn open_help(&mut self) {
        self.show_help = true;
        self.help_scroll = ScrollViewState::default();
    }

    pub fn focus_pane(&mut self, pane: FocusPane) {
        self.focused_pane = pane;
    }

    pub fn focus_next_pane(&mut self) {
        let next = match self.focused_pane {
            FocusPane::Heatmap => FocusPane::Hotspots,
            FocusPane::Hotspots => FocusPane::Heatmap,
        };
        self.focus_pane(next);
    }

    /// With two panes, backwards is the same cycle.
    pub fn focus_prev_pane(&mut self) {
        self.focus_next_pane();
    }
}
