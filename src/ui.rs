use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect, Size},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, BorderType, Borders, Chart, Clear, Dataset, GraphType, List, ListItem,
        Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Widget, Wrap,
    },
};
use tui_scrollview::{ScrollView, ScrollbarVisibility};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app_core::chart::CellChart;
use crate::app_core::geometry::{
    CellIndex, CellSize, NaturalSize, PointerPoint, ViewportRect, image_pixel_at,
};
use crate::app_core::heatmap::{HeatmapImage, fit_image_rect};
use crate::app_core::state::SnapshotPreview;
use crate::app_core::view::cell_title;
use crate::theme::{HeatmapStyle, ThemeConfig};
use crate::{AppState, FocusPane};

/// Main UI entry point that renders the entire application layout.
pub fn ui(f: &mut Frame, app: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Main area - takes all space
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
        .split(chunks[0]);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(main_chunks[1]);

    app.heatmap_area = Some(main_chunks[0]);
    app.hotspot_area = Some(side_chunks[1]);

    render_heatmap(f, app, main_chunks[0]);
    render_summary(f, app, side_chunks[0]);
    render_hotspots(f, app, side_chunks[1]);
    render_status_bar(f, app, chunks[1]);

    if app.cell_modal.is_some() {
        render_cell_modal(f, app);
    }
    if app.show_video_picker {
        render_video_picker(f, app);
    } else if app.show_help {
        render_help_overlay(f, app);
    }
}

fn focus_border(app: &AppState, pane: FocusPane) -> Style {
    if app.focused_pane == pane {
        app.theme.border_selected
    } else {
        app.theme.border
    }
}

/// Renders the heatmap pane: the image scaled to fit, with grid cursor,
/// hover and hotspot markers drawn over it.
fn render_heatmap(f: &mut Frame, app: &mut AppState, area: Rect) {
    let is_focused = app.focused_pane == FocusPane::Heatmap;
    let title = match (app.video_id, app.video_name.as_deref()) {
        (Some(id), Some(name)) if !name.is_empty() => format!(" Heatmap: #{} {} ", id, name),
        (Some(id), _) => format!(" Heatmap: #{} ", id),
        (None, _) => " Heatmap ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_border(app, FocusPane::Heatmap))
        .title_style(app.theme.title)
        .title(title)
        .title_bottom(if is_focused {
            Line::from(" ←↑↓→ move • Enter open • Tab cycle ").right_aligned()
        } else {
            Line::from("").right_aligned()
        })
        .style(app.theme.list_normal);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let image_rect = fit_image_rect(inner_area, app.heatmap.natural_size());
    if image_rect.width == 0 || image_rect.height == 0 {
        app.image_area = None;
        return;
    }
    app.image_area = Some(image_rect);

    let canvas = HeatmapCanvas {
        heatmap: &app.heatmap,
        cell_size: app.cell_size,
        selected: app.selected_cell,
        hovered: app.hovered_cell,
        hot_cells: &app.hot_cells,
        style: app.theme.heatmap,
    };
    f.render_widget(canvas, image_rect);

    if app.heatmap_loading {
        let label = " loading heatmap… ";
        let width = (label.width() as u16).min(image_rect.width);
        let label_rect = Rect::new(
            image_rect.x + (image_rect.width - width) / 2,
            image_rect.y + image_rect.height / 2,
            width,
            1,
        );
        f.render_widget(Paragraph::new(label).style(app.theme.text), label_rect);
    }
}

/// Draws the heatmap with half-block glyphs: the upper half of each terminal
/// cell shows one image sample, the lower half another.
struct HeatmapCanvas<'a> {
    heatmap: &'a HeatmapImage,
    cell_size: CellSize,
    selected: CellIndex,
    hovered: Option<CellIndex>,
    hot_cells: &'a foldhash::HashSet<CellIndex>,
    style: HeatmapStyle,
}

impl Widget for HeatmapCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let viewport = ViewportRect::from(area);
        let natural = self.heatmap.natural_size();

        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let (top, bottom) = half_block_colors(self.heatmap, x, y, viewport);
                let span = CellSpan::for_terminal_cell(x, y, viewport, natural, self.cell_size);

                let cell = &mut buf[(x, y)];
                if span.covers(self.selected) {
                    cell.set_symbol("█").set_fg(self.style.cursor).set_bg(bottom);
                } else if self.hovered.is_some_and(|hovered| span.covers(hovered)) {
                    cell.set_symbol("▒").set_fg(self.style.hover).set_bg(top);
                } else if self.hot_cells.iter().any(|&hot| span.covers(hot)) {
                    cell.set_symbol("◆").set_fg(self.style.hotspot).set_bg(top);
                } else {
                    cell.set_symbol("▀")
                        .set_fg(top)
                        .set_bg(bottom);
                }
            }
        }
    }
}

/// Draws a plain image with half-block glyphs, no overlays.
struct ImageCanvas<'a> {
    image: &'a HeatmapImage,
}

impl Widget for ImageCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let viewport = ViewportRect::from(area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let (top, bottom) = half_block_colors(self.image, x, y, viewport);
                buf[(x, y)].set_symbol("▀").set_fg(top).set_bg(bottom);
            }
        }
    }
}

/// Image colors for the upper and lower half of terminal cell `(x, y)`.
fn half_block_colors(image: &HeatmapImage, x: u16, y: u16, viewport: ViewportRect) -> (Color, Color) {
    let natural = image.natural_size();
    let (fx, fy) = (x as f64, y as f64);
    let (tx, ty) = image_pixel_at(PointerPoint::new(fx + 0.5, fy + 0.25), viewport, natural);
    let (bx, by) = image_pixel_at(PointerPoint::new(fx + 0.5, fy + 0.75), viewport, natural);
    (rgb(image.sample(tx, ty)), rgb(image.sample(bx, by)))
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

/// Inclusive range of grid cells a terminal cell overlaps.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CellSpan {
    gx: (i64, i64),
    gy: (i64, i64),
}

impl CellSpan {
    fn for_terminal_cell(
        column: u16,
        row: u16,
        viewport: ViewportRect,
        natural: NaturalSize,
        cell_size: CellSize,
    ) -> Self {
        let side = cell_size.get() as f64;
        let (x0, y0) = image_pixel_at(PointerPoint::new(column as f64, row as f64), viewport, natural);
        let (x1, y1) = image_pixel_at(
            PointerPoint::new(column as f64 + 1.0, row as f64 + 1.0),
            viewport,
            natural,
        );
        let first_x = (x0 / side).floor() as i64;
        let first_y = (y0 / side).floor() as i64;
        let last_x = ((x1 / side).ceil() as i64 - 1).max(first_x);
        let last_y = ((y1 / side).ceil() as i64 - 1).max(first_y);
        Self {
            gx: (first_x, last_x),
            gy: (first_y, last_y),
        }
    }

    fn covers(&self, cell: CellIndex) -> bool {
        (self.gx.0..=self.gx.1).contains(&cell.gx) && (self.gy.0..=self.gy.1).contains(&cell.gy)
    }
}

fn render_summary(f: &mut Frame, app: &mut AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border)
        .title_style(app.theme.title)
        .title(" Summary ")
        .style(app.theme.text);

    let label_style = app.theme.title;
    let value_style = app.theme.text;
    let muted = app.theme.muted;

    let (total_moves, avg_dwell) = match (&app.summary, app.dashboard_loading) {
        (Some(view), _) => (view.total_moves.clone(), format!("{} s", view.avg_dwell)),
        (None, true) => ("…".to_string(), "…".to_string()),
        (None, false) => ("–".to_string(), "–".to_string()),
    };
    let grid = app.grid();
    let hover = app
        .hovered_cell
        .map(|cell| cell.to_string())
        .unwrap_or_else(|| "–".to_string());

    let row = |label: &str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(format!("{: <12}", label), label_style),
            Span::styled(value, style),
        ])
    };

    let lines = vec![
        row("Total moves", total_moves, value_style),
        row("Avg dwell", avg_dwell, value_style),
        row(
            "Grid",
            format!("{}×{} @ {}px", grid.cols, grid.rows, app.cell_size.get()),
            muted,
        ),
        row("Cursor", app.selected_cell.to_string(), value_style),
        row("Hover", hover, muted),
        row("Server", app.server_label.clone(), muted),
    ];

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_hotspots(f: &mut Frame, app: &mut AppState, area: Rect) {
    let is_focused = app.focused_pane == FocusPane::Hotspots;
    let rows = app
        .summary
        .as_ref()
        .map(|view| view.hotspots.as_slice())
        .unwrap_or(&[]);

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", idx + 1), app.theme.title),
                Span::raw(row.label.as_str()),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_border(app, FocusPane::Hotspots))
        .title_style(app.theme.title)
        .title(format!(" Hotspots ({}) ", rows.len()))
        .title_bottom(if is_focused {
            Line::from(" ↑/↓ move • Enter open ").right_aligned()
        } else {
            Line::from("").right_aligned()
        })
        .title_alignment(Alignment::Left)
        .style(app.theme.list_normal);

    app.hotspot_content_area = Some(block.inner(area));

    let list = List::new(items)
        .block(block)
        .style(app.theme.list_normal)
        .highlight_style(app.theme.list_selected);

    f.render_stateful_widget(list, area, &mut app.hotspot_state);
}

fn render_status_bar(f: &mut Frame, app: &mut AppState, area: Rect) {
    let area = Rect::new(
        area.x + 1,
        area.y,
        area.width.saturating_sub(2),
        area.height,
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(45),
            Constraint::Percentage(20),
        ])
        .split(area);

    render_status_bar_shortcuts(f, app, chunks[0]);
    render_status_bar_operational(f, app, chunks[1]);
    render_status_bar_version(f, app, chunks[2]);
}

fn render_status_bar_shortcuts(f: &mut Frame, app: &mut AppState, area: Rect) {
    let key_style = app.theme.title;
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);

    let shortcuts = Line::from(vec![
        Span::styled("v ", key_style),
        Span::raw("videos  "),
        Span::styled("r ", key_style),
        Span::raw("reload  "),
        Span::styled("? ", key_style),
        Span::raw("help  "),
        Span::styled("q ", key_style),
        Span::raw("quit"),
    ]);

    f.render_widget(
        Paragraph::new(shortcuts)
            .style(bar_style)
            .alignment(Alignment::Left),
        area,
    );
}

fn render_status_bar_operational(f: &mut Frame, app: &mut AppState, area: Rect) {
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);
    let (text, style) = match &app.status {
        Some(status) if status.is_error => (status.text.as_str(), app.theme.error),
        Some(status) => (status.text.as_str(), bar_style),
        None if app.dashboard_loading || app.heatmap_loading => ("Loading…", bar_style),
        None => ("", bar_style),
    };

    f.render_widget(
        Paragraph::new(truncate_to_width(text, area.width as usize))
            .style(style)
            .alignment(Alignment::Center),
        area,
    );
}

fn render_status_bar_version(f: &mut Frame, app: &mut AppState, area: Rect) {
    let bar_style = app.theme.text.add_modifier(Modifier::DIM);
    f.render_widget(
        Paragraph::new(format!("heatmap-tui {}", app.app_version))
            .style(bar_style)
            .alignment(Alignment::Right),
        area,
    );
}

fn popup_rect(area: Rect, max_width: u16, max_height: u16) -> Option<Rect> {
    let popup_width = area.width.min(max_width).saturating_sub(4);
    let popup_height = area.height.min(max_height).saturating_sub(2);
    if popup_width == 0 || popup_height == 0 {
        return None;
    }
    Some(Rect::new(
        area.x + (area.width.saturating_sub(popup_width)) / 2,
        area.y + (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    ))
}

/// Cell-detail modal: visit chart on top, snapshot list and preview below.
fn render_cell_modal(f: &mut Frame, app: &mut AppState) {
    app.install_pending_chart();

    let area = f.area();
    let max_width = (area.width as u32 * 9 / 10) as u16;
    let max_height = (area.height as u32 * 9 / 10) as u16;
    let Some(popup_rect) = popup_rect(area, max_width.max(40), max_height.max(12)) else {
        app.modal_area = None;
        return;
    };
    app.modal_area = Some(popup_rect);
    f.render_widget(Clear, popup_rect);

    let theme = &app.theme;
    let Some(modal) = app.cell_modal.as_mut() else {
        return;
    };

    let title = modal
        .detail
        .as_ref()
        .map(|detail| detail.title.clone())
        .unwrap_or_else(|| cell_title(modal.cell));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_selected)
        .style(theme.text)
        .title(format!(" {} ", title))
        .title_style(theme.title)
        .title_bottom(Line::from(" ↑/↓ snapshots • Esc close ").right_aligned());

    let inner_area = block.inner(popup_rect);
    f.render_widget(block, popup_rect);
    if inner_area.width == 0 || inner_area.height == 0 {
        return;
    }

    if let Some(error) = &modal.error {
        app.snapshot_content_area = None;
        f.render_widget(
            Paragraph::new(format!("Could not load cell history: {}", error))
                .style(theme.error)
                .wrap(Wrap { trim: true }),
            inner_area.inner(Margin::new(1, 1)),
        );
        return;
    }

    let Some(detail) = &modal.detail else {
        app.snapshot_content_area = None;
        f.render_widget(
            Paragraph::new("Loading…")
                .style(theme.muted)
                .alignment(Alignment::Center),
            inner_area.inner(Margin::new(1, 1)),
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Min(3)])
        .split(inner_area);
    let gallery = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Min(0)])
        .split(chunks[1]);

    let chart = app
        .cell_chart
        .as_ref()
        .filter(|chart| chart.cell() == modal.cell);
    match chart {
        Some(chart) if !chart.is_empty() => {
            render_visit_chart(f, chart, &theme.heatmap, theme.text, chunks[0]);
        }
        _ => {
            f.render_widget(
                Paragraph::new("No visits recorded for this cell")
                    .style(theme.muted)
                    .alignment(Alignment::Center),
                chunks[0],
            );
        }
    }

    let snapshots_block = Block::default()
        .borders(Borders::TOP)
        .border_style(theme.border)
        .title(format!(" Snapshots ({}) ", detail.snapshots.len()))
        .title_style(theme.title);
    let content_area = snapshots_block.inner(gallery[0]);
    app.snapshot_content_area = Some(content_area);

    let max_width = content_area.width as usize;
    let items: Vec<ListItem> = if detail.snapshots.is_empty() {
        vec![ListItem::new(Span::styled("No snapshots", theme.muted))]
    } else {
        detail
            .snapshots
            .iter()
            .map(|url| ListItem::new(truncate_to_width(url, max_width)))
            .collect()
    };
    let snapshot_count = detail.snapshots.len();

    let list = List::new(items)
        .block(snapshots_block)
        .style(theme.text)
        .highlight_style(theme.list_selected);
    f.render_stateful_widget(list, gallery[0], &mut modal.snapshot_state);

    if snapshot_count > content_area.height as usize {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        let mut scrollbar_state = ScrollbarState::new(snapshot_count)
            .position(modal.snapshot_state.selected().unwrap_or(0));
        f.render_stateful_widget(scrollbar, content_area, &mut scrollbar_state);
    }

    let preview_block = Block::default()
        .borders(Borders::TOP | Borders::LEFT)
        .border_style(theme.border)
        .title(" Preview ")
        .title_style(theme.title);
    let preview_area = preview_block.inner(gallery[1]);
    f.render_widget(preview_block, gallery[1]);
    render_snapshot_preview(f, modal.preview.as_ref(), theme, preview_area);
}

fn render_snapshot_preview(
    f: &mut Frame,
    preview: Option<&SnapshotPreview>,
    theme: &ThemeConfig,
    area: Rect,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let message = match preview {
        Some(SnapshotPreview::Ready { image, .. }) => {
            let image_rect = fit_image_rect(area, image.natural_size());
            if image_rect.width > 0 && image_rect.height > 0 {
                f.render_widget(ImageCanvas { image }, image_rect);
            }
            return;
        }
        Some(SnapshotPreview::Loading { .. }) => {
            Paragraph::new("Loading snapshot…").style(theme.muted)
        }
        Some(SnapshotPreview::Failed { error, .. }) => {
            Paragraph::new(format!("Snapshot unavailable: {}", error)).style(theme.error)
        }
        None => Paragraph::new("No snapshot selected").style(theme.muted),
    };
    f.render_widget(
        message.alignment(Alignment::Center).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_visit_chart(
    f: &mut Frame,
    chart: &CellChart,
    colors: &HeatmapStyle,
    text: Style,
    area: Rect,
) {
    let axis_style = Style::default().fg(colors.chart_axis);
    let dataset = Dataset::default()
        .name("Visitors")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(colors.chart_line))
        .data(chart.points());

    let x_bounds = chart.x_bounds();
    let y_bounds = chart.y_bounds();
    let widget = Chart::new(vec![dataset])
        .style(text)
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(axis_style)
                .bounds(x_bounds)
                .labels(CellChart::axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title("Visits")
                .style(axis_style)
                .bounds(y_bounds)
                .labels(CellChart::axis_labels(y_bounds)),
        );
    f.render_widget(widget, area);
}

fn render_help_overlay(f: &mut Frame, app: &mut AppState) {
    let Some(popup_rect) = popup_rect(f.area(), 64, 26) else {
        return;
    };

    f.render_widget(Clear, popup_rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_selected)
        .style(app.theme.text)
        .title(" Help ")
        .border_type(BorderType::Double)
        .title_style(app.theme.title);

    let inner_area = block.inner(popup_rect).inner(Margin::new(1, 0));
    f.render_widget(block, popup_rect);
    if inner_area.width == 0 || inner_area.height == 0 {
        return;
    }

    let key_style = app.theme.title;
    let desc_style = app.theme.text;
    let header_style = key_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let format_section = |title: &str, items: &[(&str, &str)]| -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(title.to_string(), header_style))];
        for (key, desc) in items {
            lines.push(Line::from(vec![
                Span::styled(format!("{: <16}", key), key_style),
                Span::styled(desc.to_string(), desc_style),
            ]));
        }
        lines.push(Line::from(""));
        lines
    };

    let mut lines = format_section(
        "Heatmap",
        &[
            ("←↑↓→ | hjkl", "move grid cursor"),
            ("Shift+arrows", "move 5 cells"),
            ("Home | End", "row start | end"),
            ("Enter | Space", "open cell history"),
            ("Mouse Click", "open clicked cell"),
        ],
    );
    lines.extend(format_section(
        "Hotspots",
        &[("↑/↓", "select"), ("Enter | Click", "open cell history")],
    ));
    lines.extend(format_section(
        "Cell history",
        &[
            ("↑/↓ | Click", "browse snapshots with preview"),
            ("Esc | Click outside", "close"),
        ],
    ));
    lines.extend(format_section(
        "General",
        &[
            ("Tab", "cycle panes"),
            ("v", "switch video"),
            ("r", "reload summary and heatmap"),
            ("?", "toggle help"),
            ("q", "quit"),
        ],
    ));

    let content_width = inner_area.width;
    let content_height = lines.len() as u16;
    let mut scroll_view = ScrollView::new(Size::new(content_width, content_height))
        .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
        .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
    let scroll_area = scroll_view.area();
    scroll_view.buf_mut().set_style(scroll_area, app.theme.text);
    scroll_view.render_widget(
        Paragraph::new(lines),
        Rect::new(0, 0, content_width, content_height),
    );

    f.render_stateful_widget(scroll_view, inner_area, &mut app.help_scroll);
}

fn render_video_picker(f: &mut Frame, app: &mut AppState) {
    let Some(popup_rect) = popup_rect(f.area(), 64, 18) else {
        app.picker_area = None;
        return;
    };
    app.picker_area = Some(popup_rect);

    f.render_widget(Clear, popup_rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_selected)
        .style(app.theme.text)
        .title(" Videos ")
        .title_style(app.theme.title);

    let inner_area = block.inner(popup_rect);
    f.render_widget(block, popup_rect);
    app.picker_content_area = Some(inner_area);

    let current = app.video_id;
    let items: Vec<ListItem> = app
        .video_entries
        .iter()
        .map(|entry| {
            let mut spans = vec![
                Span::styled(format!("#{: <5}", entry.id), app.theme.title),
                Span::styled(entry.name.as_str(), app.theme.text),
            ];
            if current == Some(entry.id) {
                spans.push(Span::styled(
                    " (current)",
                    app.theme.text.add_modifier(Modifier::DIM),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default())
        .style(app.theme.list_normal)
        .highlight_style(app.theme.list_selected);

    f.render_stateful_widget(list, inner_area, &mut app.video_list_state);
}

/// Cuts `text` to at most `max_width` display columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width - 1 {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out.push('…');
    out
}
