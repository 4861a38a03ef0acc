//! Owned handle for the per-cell visit chart.
//!
//! Exactly one chart is live at a time. It is swapped through
//! [`replace_chart`], which releases the previous handle before the new one
//! takes its place.

use crate::app_core::geometry::CellIndex;
use crate::model::SeriesPoint;

#[derive(Debug, PartialEq)]
pub struct CellChart {
    cell: CellIndex,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl CellChart {
    /// Builds the chart from a time-ordered series. The y axis always starts
    /// at zero.
    pub fn new(cell: CellIndex, series: &[SeriesPoint]) -> Self {
        let points: Vec<(f64, f64)> = series.iter().map(|p| (p.t, p.count)).collect();

        let (x_min, x_max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(t, _)| {
                (lo.min(t), hi.max(t))
            });
        let x_bounds = if points.is_empty() {
            [0.0, 1.0]
        } else if x_min == x_max {
            [x_min - 1.0, x_max + 1.0]
        } else {
            [x_min, x_max]
        };

        let y_max = points.iter().map(|&(_, c)| c).fold(0.0_f64, f64::max);
        let y_bounds = [0.0, if y_max > 0.0 { y_max * 1.1 } else { 1.0 }];

        Self {
            cell,
            points,
            x_bounds,
            y_bounds,
        }
    }

    pub fn cell(&self) -> CellIndex {
        self.cell
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        self.x_bounds
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }

    /// Start, middle and end labels for an axis.
    pub fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
        let mid = (bounds[0] + bounds[1]) / 2.0;
        [bounds[0], mid, bounds[1]]
            .iter()
            .map(|v| format!("{:.0}", v))
            .collect()
    }
}

impl Drop for CellChart {
    fn drop(&mut self) {
        tracing::trace!(cell = %self.cell, points = self.points.len(), "chart released");
    }
}

/// Releases `previous` (if any) and installs `next`.
pub fn replace_chart(previous: Option<CellChart>, next: CellChart) -> CellChart {
    if let Some(old) = previous {
        tracing::debug!(from = %old.cell(), to = %next.cell(), "replacing chart");
        drop(old);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(f64, f64)]) -> Vec<SeriesPoint> {
        points
            .iter()
            .map(|&(t, count)| SeriesPoint { t, count })
            .collect()
    }

    #[test]
    fn bounds_cover_series_and_start_y_at_zero() {
        let chart = CellChart::new(
            CellIndex::new(1, 2),
            &series(&[(10.0, 4.0), (20.0, 10.0), (30.0, 2.0)]),
        );
        assert_eq!(chart.x_bounds(), [10.0, 30.0]);
        assert_eq!(chart.y_bounds()[0], 0.0);
        assert!((chart.y_bounds()[1] - 11.0).abs() < 1e-9);
        assert_eq!(chart.points()[1], (20.0, 10.0));
    }

    #[test]
    fn empty_and_single_point_series_get_usable_bounds() {
        let empty = CellChart::new(CellIndex::new(0, 0), &[]);
        assert!(empty.is_empty());
        assert_eq!(empty.x_bounds(), [0.0, 1.0]);
        assert_eq!(empty.y_bounds(), [0.0, 1.0]);

        let single = CellChart::new(CellIndex::new(0, 0), &series(&[(40.0, 0.0)]));
        assert_eq!(single.x_bounds(), [39.0, 41.0]);
        assert_eq!(single.y_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn replace_returns_the_new_handle() {
        let first = CellChart::new(CellIndex::new(1, 1), &series(&[(1.0, 1.0)]));
        let second = CellChart::new(CellIndex::new(2, 2), &series(&[(1.0, 5.0)]));

        let current = replace_chart(None, first);
        assert_eq!(current.cell(), CellIndex::new(1, 1));

        let current = replace_chart(Some(current), second);
        assert_eq!(current.cell(), CellIndex::new(2, 2));
    }

    struct Wrapper<T>(std::marker::PhantomData<T>);

    trait NotClone {
        fn is_clone(&self) -> bool {
            false
        }
    }
    impl<T> NotClone for Wrapper<T> {}

    impl<T: Clone> Wrapper<T> {
        fn is_clone(&self) -> bool {
            true
        }
    }

    #[test]
    fn chart_handle_has_a_single_owner() {
        // Inherent methods win over trait methods when their bounds hold.
        assert!(Wrapper::<Vec<u8>>(std::marker::PhantomData).is_clone());
        assert!(!Wrapper::<CellChart>(std::marker::PhantomData).is_clone());
    }

    #[test]
    fn axis_labels_span_bounds() {
        assert_eq!(CellChart::axis_labels([0.0, 100.0]), vec!["0", "50", "100"]);
    }
}
