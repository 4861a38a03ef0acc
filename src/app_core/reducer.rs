//! Event reducer: key, mouse and fetch-response handlers.
//!
//! The runtime converts crossterm events to [`AppKeyEvent`] / [`AppMouseEvent`]
//! and forwards fetch results as [`FetchResponse`]. None of these handlers
//! perform I/O; they may set `app.pending_action` for the runtime to execute.

use crate::app_core::fetch::FetchResponse;
use crate::app_core::heatmap::HeatmapImage;
use crate::app_core::input::{AppKeyCode, AppKeyEvent, AppMouseEvent, AppMouseKind};
use crate::app_core::state::{AppAction, AppState, FocusPane};

pub const SCROLL_LINES: u16 = 1;
/// Cursor step with Shift held or for PageUp/PageDown.
pub const FAST_STEP: i64 = 5;

/// Returns the pane that contains the given cell coordinates, if any.
pub fn pane_at(app: &AppState, column: u16, row: u16) -> Option<FocusPane> {
    if let Some(area) = app.heatmap_area
        && area.contains((column, row).into())
    {
        return Some(FocusPane::Heatmap);
    }
    if let Some(area) = app.hotspot_area
        && area.contains((column, row).into())
    {
        return Some(FocusPane::Hotspots);
    }
    None
}

/// Handle a key event, mutating `app` in place.
pub fn handle_key_event(app: &mut AppState, event: AppKeyEvent) {
    let code = event.code;

    if event.ctrl && code == AppKeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        match code {
            AppKeyCode::Char('?') | AppKeyCode::Esc | AppKeyCode::Char('q') => {
                app.show_help = false
            }
            AppKeyCode::Up => app.help_scroll.scroll_up(),
            AppKeyCode::Down => app.help_scroll.scroll_down(),
            _ => {}
        }
        return;
    }

    if app.show_video_picker {
        match code {
            AppKeyCode::Esc | AppKeyCode::Char('q') => app.show_video_picker = false,
            AppKeyCode::Up => app.video_list_state.select_previous(),
            AppKeyCode::Down => app.video_list_state.select_next(),
            AppKeyCode::Enter => choose_selected_video(app),
            _ => {}
        }
        return;
    }

    if app.cell_modal.is_some() {
        match code {
            AppKeyCode::Esc | AppKeyCode::Char('q') => app.close_cell_modal(),
            AppKeyCode::Up => app.move_snapshot_selection(-1),
            AppKeyCode::Down => app.move_snapshot_selection(1),
            _ => {}
        }
        return;
    }

    match code {
        AppKeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        AppKeyCode::Char('?') => {
            app.open_help();
            return;
        }
        AppKeyCode::Char('r') => {
            match app.video_id {
                Some(video_id) => app.select_video(video_id),
                None => app.set_error("No video selected"),
            }
            return;
        }
        AppKeyCode::Char('v') => {
            app.video_picker_requested = true;
            app.set_status("Loading videos");
            app.pending_action = Some(AppAction::OpenVideoPicker);
            return;
        }
        AppKeyCode::Tab => {
            if event.shift {
                app.focus_prev_pane();
            } else {
                app.focus_next_pane();
            }
            return;
        }
        AppKeyCode::BackTab => {
            app.focus_prev_pane();
            return;
        }
        _ => {}
    }

    match app.focused_pane {
        FocusPane::Heatmap => handle_heatmap_key(app, event),
        FocusPane::Hotspots => handle_hotspot_key(app, code),
    }
}

fn handle_heatmap_key(app: &mut AppState, event: AppKeyEvent) {
    let step = if event.shift { FAST_STEP } else { 1 };
    let grid = app.grid();
    match event.code {
        AppKeyCode::Left | AppKeyCode::Char('h') => app.move_cursor(-step, 0),
        AppKeyCode::Right | AppKeyCode::Char('l') => app.move_cursor(step, 0),
        AppKeyCode::Up | AppKeyCode::Char('k') => app.move_cursor(0, -step),
        AppKeyCode::Down | AppKeyCode::Char('j') => app.move_cursor(0, step),
        AppKeyCode::PageUp => app.move_cursor(0, -FAST_STEP),
        AppKeyCode::PageDown => app.move_cursor(0, FAST_STEP),
        AppKeyCode::Home => app.move_cursor(-(grid.cols as i64), 0),
        AppKeyCode::End => app.move_cursor(grid.cols as i64, 0),
        AppKeyCode::Enter | AppKeyCode::Char(' ') => app.open_cell(app.selected_cell),
        _ => {}
    }
}

fn handle_hotspot_key(app: &mut AppState, code: AppKeyCode) {
    match code {
        AppKeyCode::Up | AppKeyCode::Char('k') => app.move_hotspot_selection(-1),
        AppKeyCode::Down | AppKeyCode::Char('j') => app.move_hotspot_selection(1),
        AppKeyCode::Home => {
            if !app.hotspots().is_empty() {
                app.hotspot_state.select(Some(0));
            }
        }
        AppKeyCode::End => {
            let len = app.hotspots().len();
            if len > 0 {
                app.hotspot_state.select(Some(len - 1));
            }
        }
        AppKeyCode::Enter => {
            if let Some(cell) = app.selected_hotspot().map(|row| row.cell) {
                app.open_cell(cell);
            }
        }
        _ => {}
    }
}

fn choose_selected_video(app: &mut AppState) {
    if let Some(idx) = app.video_list_state.selected()
        && let Some(video_id) = app.video_entries.get(idx).map(|entry| entry.id)
    {
        app.show_video_picker = false;
        app.select_video(video_id);
    }
}

/// Handle a mouse event. Returns `true` when the screen needs a redraw.
pub fn handle_mouse_event(app: &mut AppState, event: AppMouseEvent) -> bool {
    let column = event.column;
    let row = event.row;

    if app.show_help {
        if event.kind == AppMouseKind::LeftDown {
            app.show_help = false;
            return true;
        }
        return false;
    }

    if app.show_video_picker {
        return handle_picker_mouse(app, event);
    }

    if app.cell_modal.is_some() {
        return handle_modal_mouse(app, event);
    }

    let mut transitioned = false;
    let hovered_pane = pane_at(app, column, row);

    match event.kind {
        AppMouseKind::Move => {
            let hovered = app.cell_at(column, row);
            if hovered != app.hovered_cell {
                app.hovered_cell = hovered;
                transitioned = true;
            }
        }
        AppMouseKind::ScrollUp | AppMouseKind::ScrollDown => {
            if hovered_pane == Some(FocusPane::Hotspots) && !app.hotspots().is_empty() {
                let direction = if event.kind == AppMouseKind::ScrollDown {
                    1
                } else {
                    -1
                };
                for _ in 0..SCROLL_LINES {
                    app.move_hotspot_selection(direction);
                }
                transitioned = true;
            }
        }
        AppMouseKind::LeftDown => {
            if let Some(pane) = hovered_pane
                && pane != app.focused_pane
            {
                app.focus_pane(pane);
                transitioned = true;
            }

            if hovered_pane == Some(FocusPane::Heatmap) {
                // Clicks in the letterbox around the image map to nothing.
                if let Some(cell) = app.cell_at(column, row) {
                    app.open_cell(cell);
                    transitioned = true;
                }
            }

            if hovered_pane == Some(FocusPane::Hotspots)
                && let Some(content_area) = app.hotspot_content_area
                && content_area.contains((column, row).into())
            {
                let list_row = (row - content_area.y) as usize;
                let clicked = app.hotspot_state.offset() + list_row;
                if let Some(cell) = app.hotspots().get(clicked).map(|hot| hot.cell) {
                    app.hotspot_state.select(Some(clicked));
                    app.open_cell(cell);
                    transitioned = true;
                }
            }
        }
    }

    transitioned
}

fn handle_modal_mouse(app: &mut AppState, event: AppMouseEvent) -> bool {
    let position = (event.column, event.row).into();
    let inside = app.modal_area.is_some_and(|area| area.contains(position));

    match event.kind {
        AppMouseKind::LeftDown if !inside => {
            app.close_cell_modal();
            true
        }
        AppMouseKind::LeftDown => {
            let Some(content) = app.snapshot_content_area else {
                return false;
            };
            if !content.contains(position) {
                return false;
            }
            let Some(modal) = app.cell_modal.as_ref() else {
                return false;
            };
            let clicked = modal.snapshot_state.offset() + (event.row - content.y) as usize;
            app.select_snapshot(clicked)
        }
        AppMouseKind::ScrollUp if inside => {
            app.move_snapshot_selection(-1);
            true
        }
        AppMouseKind::ScrollDown if inside => {
            app.move_snapshot_selection(1);
            true
        }
        _ => false,
    }
}

fn handle_picker_mouse(app: &mut AppState, event: AppMouseEvent) -> bool {
    let position = (event.column, event.row).into();
    let inside = app.picker_area.is_some_and(|area| area.contains(position));

    match event.kind {
        AppMouseKind::LeftDown if !inside => {
            app.show_video_picker = false;
            true
        }
        AppMouseKind::LeftDown => {
            if let Some(content) = app.picker_content_area
                && content.contains(position)
            {
                let clicked = app.video_list_state.offset() + (event.row - content.y) as usize;
                if clicked < app.video_entries.len() {
                    app.video_list_state.select(Some(clicked));
                    choose_selected_video(app);
                    return true;
                }
            }
            false
        }
        AppMouseKind::ScrollUp if inside => {
            app.video_list_state.select_previous();
            true
        }
        AppMouseKind::ScrollDown if inside => {
            app.video_list_state.select_next();
            true
        }
        _ => false,
    }
}

/// Applies a finished fetch. Responses for another video, and heatmap or cell
/// responses older than the latest request, are dropped.
pub fn apply_response(app: &mut AppState, response: FetchResponse) {
    match response {
        FetchResponse::Dashboard { video_id, result } => {
            if app.video_id != Some(video_id) {
                tracing::debug!(video_id, "dropping dashboard for inactive video");
                return;
            }
            match result {
                Ok(summary) => {
                    tracing::info!(
                        video_id,
                        total_moves = summary.total_moves,
                        hotspots = summary.top5.len(),
                        "dashboard loaded"
                    );
                    app.apply_summary(&summary);
                    app.status = None;
                }
                Err(err) => {
                    app.dashboard_loading = false;
                    app.set_error(format!("Summary unavailable: {}", err));
                }
            }
        }
        FetchResponse::Heatmap {
            video_id,
            ticket,
            result,
        } => {
            if app.video_id != Some(video_id) {
                tracing::debug!(video_id, "dropping heatmap for inactive video");
                return;
            }
            if ticket != app.latest_heatmap_ticket {
                tracing::debug!(video_id, ticket, "dropping stale heatmap response");
                return;
            }
            match result.and_then(|bytes| HeatmapImage::decode(&bytes)) {
                Ok(heatmap) => {
                    tracing::info!(
                        video_id,
                        width = heatmap.width(),
                        height = heatmap.height(),
                        "heatmap loaded"
                    );
                    app.set_heatmap(heatmap);
                }
                Err(err) => {
                    tracing::warn!(video_id, "heatmap unavailable, showing placeholder: {}", err);
                    let (width, height) = (app.heatmap.width(), app.heatmap.height());
                    app.set_heatmap(HeatmapImage::placeholder(width, height, app.cell_size));
                    app.set_error(format!("Heatmap unavailable: {}", err));
                }
            }
        }
        FetchResponse::Cell {
            video_id,
            cell,
            ticket,
            result,
        } => {
            if app.video_id != Some(video_id) {
                return;
            }
            match result {
                Ok(detail) => {
                    if !app.apply_cell_detail(cell, ticket, &detail) {
                        tracing::debug!(%cell, ticket, "dropping stale cell response");
                    }
                }
                Err(err) => {
                    if ticket != app.latest_cell_ticket {
                        return;
                    }
                    let Some(modal) = app.cell_modal.as_mut() else {
                        return;
                    };
                    if modal.ticket != ticket {
                        return;
                    }
                    modal.error = Some(err.to_string());
                    app.set_error(format!("Cell {} unavailable: {}", cell, err));
                }
            }
        }
        FetchResponse::Snapshot {
            video_id,
            ticket,
            url,
            result,
        } => {
            if app.video_id != Some(video_id) {
                return;
            }
            let decoded = result
                .and_then(|bytes| HeatmapImage::decode(&bytes))
                .map_err(|err| err.to_string());
            if !app.apply_snapshot(ticket, &url, decoded) {
                tracing::debug!(ticket, %url, "dropping stale snapshot");
            }
        }
        FetchResponse::Videos { result } => {
            let requested = std::mem::take(&mut app.video_picker_requested);
            match result {
                Ok(entries) => {
                    if app.video_id.is_none()
                        && !requested
                        && let Some(newest) = entries.first().map(|entry| entry.id)
                    {
                        app.video_entries = entries;
                        app.select_video(newest);
                        return;
                    }
                    if requested {
                        app.status = None;
                        app.open_video_picker(entries);
                    } else {
                        app.video_entries = entries;
                    }
                    if app.video_entries.is_empty() {
                        app.set_error("The server has no processed videos");
                    }
                }
                Err(err) => app.set_error(format!("Video list unavailable: {}", err)),
            }
        }
    }
}
