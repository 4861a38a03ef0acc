//! Click-to-cell coordinate mapping for a scaled heatmap image.
//!
//! The heatmap is drawn into a viewport rectangle that rarely matches the
//! image's natural resolution. These helpers undo that scaling and turn a
//! pointer position into the grid cell the backend addresses. Everything here
//! is pure so both the reducer and the renderer can share it.

use std::num::NonZeroU32;

/// On-screen bounding box of the rendered image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// `true` when either side is zero, negative or not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Half-open containment: the right and bottom edges belong to the next
    /// element, not to the image.
    pub fn contains(&self, point: PointerPoint) -> bool {
        let local_x = point.x - self.left;
        let local_y = point.y - self.top;
        local_x >= 0.0 && local_y >= 0.0 && local_x < self.width && local_y < self.height
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

impl From<ratatui::layout::Rect> for ViewportRect {
    fn from(rect: ratatui::layout::Rect) -> Self {
        Self::new(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }
}

/// Intrinsic pixel dimensions of the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

impl NaturalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }
}

/// Viewport-space pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Centre of a terminal cell. Terminals report the cell, not a sub-cell
    /// position, so the centre is the least biased estimate.
    pub fn cell_center(column: u16, row: u16) -> Self {
        Self::new(column as f64 + 0.5, row as f64 + 0.5)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Side length of a grid cell in natural-image pixels. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSize(NonZeroU32);

impl CellSize {
    /// The grid used by the heatmap generator.
    pub const DEFAULT: CellSize = CellSize(NonZeroU32::new(20).unwrap());

    pub fn new(pixels: u32) -> Option<Self> {
        NonZeroU32::new(pixels).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Zero-based grid coordinates of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellIndex {
    pub gx: i64,
    pub gy: i64,
}

impl CellIndex {
    pub fn new(gx: i64, gy: i64) -> Self {
        Self { gx, gy }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.gx.saturating_add(dx), self.gy.saturating_add(dy))
    }
}

impl std::fmt::Display for CellIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.gx, self.gy)
    }
}

/// Number of cell columns and rows covering an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub cols: u32,
    pub rows: u32,
}

impl GridDims {
    /// A partial cell at the right or bottom edge still counts.
    pub fn for_image(width: u32, height: u32, cell_size: CellSize) -> Self {
        Self {
            cols: width.div_ceil(cell_size.get()),
            rows: height.div_ceil(cell_size.get()),
        }
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        cell.gx >= 0 && cell.gy >= 0 && cell.gx < self.cols as i64 && cell.gy < self.rows as i64
    }

    pub fn clamp(&self, cell: CellIndex) -> CellIndex {
        let max_x = (self.cols as i64 - 1).max(0);
        let max_y = (self.rows as i64 - 1).max(0);
        CellIndex::new(cell.gx.clamp(0, max_x), cell.gy.clamp(0, max_y))
    }
}

/// Converts a viewport point into natural-image pixel coordinates.
pub fn image_pixel_at(
    point: PointerPoint,
    viewport: ViewportRect,
    natural: NaturalSize,
) -> (f64, f64) {
    let scale_x = natural.width / viewport.width;
    let scale_y = natural.height / viewport.height;
    (
        (point.x - viewport.left) * scale_x,
        (point.y - viewport.top) * scale_y,
    )
}

/// Maps a pointer point to the grid cell under it.
///
/// No validation or clamping is done: points outside `viewport` produce
/// negative or out-of-grid indices, and a zero-sized viewport yields a
/// saturated, meaningless index. Use [`map_click_in_bounds`] when the input
/// is not already known to be good.
pub fn map_click_to_cell(
    point: PointerPoint,
    viewport: ViewportRect,
    natural: NaturalSize,
    cell_size: CellSize,
) -> CellIndex {
    let (x_img, y_img) = image_pixel_at(point, viewport, natural);
    let side = cell_size.get() as f64;
    CellIndex::new((x_img / side).floor() as i64, (y_img / side).floor() as i64)
}

/// Checked variant of [`map_click_to_cell`].
///
/// Returns `None` for a degenerate viewport or a point outside it.
pub fn map_click_in_bounds(
    point: PointerPoint,
    viewport: ViewportRect,
    natural: NaturalSize,
    cell_size: CellSize,
) -> Option<CellIndex> {
    if viewport.is_degenerate() || !viewport.contains(point) {
        return None;
    }
    Some(map_click_to_cell(point, viewport, natural, cell_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_200() -> NaturalSize {
        NaturalSize::new(200, 200)
    }

    fn cell20() -> CellSize {
        CellSize::new(20).unwrap()
    }

    #[test]
    fn maps_reference_click() {
        let viewport = ViewportRect::new(0.0, 0.0, 100.0, 100.0);
        let point = PointerPoint::new(55.0, 65.0);

        let (x_img, y_img) = image_pixel_at(point, viewport, square_200());
        assert_relative_eq!(x_img, 110.0);
        assert_relative_eq!(y_img, 130.0);

        let cell = map_click_to_cell(point, viewport, square_200(), cell20());
        assert_eq!(cell, CellIndex::new(5, 6));
    }

    #[test]
    fn top_left_corner_is_origin_cell() {
        let viewports = [
            ViewportRect::new(0.0, 0.0, 100.0, 100.0),
            ViewportRect::new(12.5, 40.0, 37.0, 81.0),
            ViewportRect::new(-30.0, 7.0, 1920.0, 1080.0),
            ViewportRect::new(3.0, 3.0, 0.25, 0.5),
        ];
        for viewport in viewports {
            let corner = PointerPoint::new(viewport.left, viewport.top);
            let cell = map_click_to_cell(corner, viewport, NaturalSize::new(1280, 720), cell20());
            assert_eq!(cell, CellIndex::new(0, 0), "viewport {:?}", viewport);
        }
    }

    #[test]
    fn cell_boundary_uses_floor() {
        // (10,10) on a 2x-downscaled image lands exactly on image pixel (20,20).
        let viewport = ViewportRect::new(0.0, 0.0, 100.0, 100.0);
        let cell = map_click_to_cell(PointerPoint::new(10.0, 10.0), viewport, square_200(), cell20());
        assert_eq!(cell, CellIndex::new(1, 1));

        let just_before =
            map_click_to_cell(PointerPoint::new(9.99, 9.99), viewport, square_200(), cell20());
        assert_eq!(just_before, CellIndex::new(0, 0));
    }

    #[test]
    fn scaling_viewport_and_click_together_keeps_cell() {
        let viewport = ViewportRect::new(8.0, 16.0, 320.0, 180.0);
        let natural = NaturalSize::new(1280, 720);
        let points = [
            PointerPoint::new(8.0, 16.0),
            PointerPoint::new(57.3, 101.1),
            PointerPoint::new(200.6, 44.2),
            PointerPoint::new(321.9, 190.7),
        ];
        for point in points {
            let expected = map_click_to_cell(point, viewport, natural, cell20());
            for factor in [0.5, 2.0, 4.0, 3.0, 1.5] {
                let scaled = map_click_to_cell(
                    point.scaled(factor),
                    viewport.scaled(factor),
                    natural,
                    cell20(),
                );
                assert_eq!(scaled, expected, "point {:?} factor {}", point, factor);
            }
        }
    }

    #[test]
    fn increasing_x_never_decreases_gx() {
        let viewport = ViewportRect::new(3.0, 5.0, 97.0, 61.0);
        let natural = NaturalSize::new(1280, 720);
        let mut previous = i64::MIN;
        let mut x = viewport.left;
        while x < viewport.left + viewport.width {
            let cell = map_click_to_cell(PointerPoint::new(x, 30.0), viewport, natural, cell20());
            assert!(cell.gx >= previous, "gx went from {} to {} at x={}", previous, cell.gx, x);
            previous = cell.gx;
            x += 0.25;
        }
        assert_eq!(previous, 63);
    }

    #[test]
    fn raw_mapping_does_not_clamp_outside_points() {
        let viewport = ViewportRect::new(10.0, 10.0, 100.0, 100.0);
        let left_of = map_click_to_cell(PointerPoint::new(0.0, 50.0), viewport, square_200(), cell20());
        assert_eq!(left_of, CellIndex::new(-1, 4));

        let below = map_click_to_cell(PointerPoint::new(50.0, 150.0), viewport, square_200(), cell20());
        assert_eq!(below, CellIndex::new(4, 14));
    }

    #[test]
    fn checked_mapping_rejects_outside_and_degenerate() {
        let viewport = ViewportRect::new(10.0, 20.0, 200.0, 100.0);
        let natural = NaturalSize::new(400, 200);

        assert_eq!(
            map_click_in_bounds(PointerPoint::new(9.0, 20.0), viewport, natural, cell20()),
            None
        );
        assert_eq!(
            map_click_in_bounds(PointerPoint::new(210.0, 50.0), viewport, natural, cell20()),
            None
        );
        assert_eq!(
            map_click_in_bounds(PointerPoint::new(60.0, 45.0), viewport, natural, cell20()),
            Some(CellIndex::new(5, 2))
        );

        let flat = ViewportRect::new(0.0, 0.0, 0.0, 100.0);
        assert_eq!(
            map_click_in_bounds(PointerPoint::new(0.0, 10.0), flat, natural, cell20()),
            None
        );
        let nan = ViewportRect::new(0.0, 0.0, f64::NAN, 100.0);
        assert!(nan.is_degenerate());
    }

    #[test]
    fn terminal_cell_center_maps_into_scaled_grid() {
        let area = ratatui::layout::Rect::new(2, 1, 64, 36);
        let viewport = ViewportRect::from(area);
        let natural = NaturalSize::new(1280, 720);
        // One terminal cell per grid cell at this size.
        let cell = map_click_in_bounds(PointerPoint::cell_center(2 + 7, 1 + 3), viewport, natural, cell20());
        assert_eq!(cell, Some(CellIndex::new(7, 3)));
    }

    #[test]
    fn grid_dims_round_up_partial_cells() {
        let dims = GridDims::for_image(1280, 720, cell20());
        assert_eq!(dims, GridDims { cols: 64, rows: 36 });

        let ragged = GridDims::for_image(1290, 721, cell20());
        assert_eq!(ragged, GridDims { cols: 65, rows: 37 });

        assert!(dims.contains(CellIndex::new(63, 35)));
        assert!(!dims.contains(CellIndex::new(64, 0)));
        assert!(!dims.contains(CellIndex::new(0, -1)));
        assert_eq!(dims.clamp(CellIndex::new(-4, 99)), CellIndex::new(0, 35));
    }

    #[test]
    fn cell_size_rejects_zero() {
        assert_eq!(CellSize::new(0), None);
        assert_eq!(CellSize::default().get(), 20);
    }
}
