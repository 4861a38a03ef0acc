//! Response types for the heatmap backend.
//!
//! Aggregates computed in SQL (`SUM(count)`, averages) may arrive as JSON
//! numbers or as decimal strings depending on the driver, so numeric fields
//! go through lenient deserializers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One of the busiest cells reported by the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HotCell {
    #[serde(deserialize_with = "de_i64")]
    pub x: i64,
    #[serde(deserialize_with = "de_i64")]
    pub y: i64,
    #[serde(deserialize_with = "de_u64")]
    pub count: u64,
}

/// `GET /api/dashboard/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardSummary {
    #[serde(deserialize_with = "de_u64")]
    pub total_moves: u64,
    #[serde(deserialize_with = "de_f64")]
    pub avg_dwell: f64,
    #[serde(default)]
    pub top5: Vec<HotCell>,
}

/// A single `(t, count)` sample of a cell's visit history.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SeriesPoint {
    #[serde(deserialize_with = "de_f64")]
    pub t: f64,
    #[serde(deserialize_with = "de_f64")]
    pub count: f64,
}

/// `GET /api/cell/{id}/{gx}/{gy}`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CellDetail {
    #[serde(default)]
    pub series: Vec<SeriesPoint>,
    /// Snapshot image URLs, in time order.
    #[serde(default)]
    pub snaps: Vec<String>,
}

/// An entry of `GET /api/videos`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoEntry {
    #[serde(deserialize_with = "de_u64")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// `GET /api/results/{id}`: media URLs plus the same statistics as the
/// dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultsInfo {
    #[serde(deserialize_with = "de_u64")]
    pub video_id: u64,
    #[serde(default)]
    pub detected_video: Option<String>,
    #[serde(default)]
    pub overlay_video: Option<String>,
    #[serde(default)]
    pub heatmap_video: Option<String>,
    pub global_heatmap: String,
    #[serde(flatten)]
    pub summary: DashboardSummary,
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => Some(0.0),
        _ => None,
    }
}

fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .filter(|n| n.is_finite())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {}", value)))
}

fn de_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = de_f64(deserializer)?;
    if n.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected an integer grid coordinate, got {}",
            n
        )));
    }
    Ok(n as i64)
}

fn de_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = de_f64(deserializer)?;
    if n < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative count, got {}",
            n
        )));
    }
    Ok(n.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_dashboard_summary() {
        let summary: DashboardSummary = serde_json::from_value(json!({
            "total_moves": 1532,
            "avg_dwell": 12.345,
            "top5": [
                {"x": 12, "y": 7, "count": 88},
                {"x": 3, "y": 30, "count": 41}
            ]
        }))
        .unwrap();

        assert_eq!(summary.total_moves, 1532);
        assert!((summary.avg_dwell - 12.345).abs() < 1e-9);
        assert_eq!(
            summary.top5,
            vec![
                HotCell { x: 12, y: 7, count: 88 },
                HotCell { x: 3, y: 30, count: 41 },
            ]
        );
    }

    #[test]
    fn accepts_decimal_strings_for_aggregates() {
        let cell: HotCell =
            serde_json::from_value(json!({"x": 4, "y": "9", "count": "17"})).unwrap();
        assert_eq!(cell, HotCell { x: 4, y: 9, count: 17 });

        let summary: DashboardSummary =
            serde_json::from_value(json!({"total_moves": 0, "avg_dwell": null})).unwrap();
        assert_eq!(summary.avg_dwell, 0.0);
        assert!(summary.top5.is_empty());
    }

    #[test]
    fn rejects_non_numeric_and_fractional_coordinates() {
        let bad = serde_json::from_value::<HotCell>(json!({"x": "left", "y": 1, "count": 1}));
        assert!(bad.is_err());

        let fractional = serde_json::from_value::<HotCell>(json!({"x": 1.5, "y": 1, "count": 1}));
        assert!(fractional.is_err());

        let negative = serde_json::from_value::<HotCell>(json!({"x": 1, "y": 1, "count": -3}));
        assert!(negative.is_err());
    }

    #[test]
    fn parses_cell_detail_in_order() {
        let detail: CellDetail = serde_json::from_value(json!({
            "series": [{"t": 10, "count": 1}, {"t": 20, "count": 3}, {"t": 30, "count": 2}],
            "snaps": ["/static/snaps/4_10.jpg", "/static/snaps/4_20.jpg"]
        }))
        .unwrap();

        let times: Vec<f64> = detail.series.iter().map(|p| p.t).collect();
        assert_eq!(times, vec![10.0, 20.0, 30.0]);
        assert_eq!(detail.series[1].count, 3.0);
        assert_eq!(detail.snaps[1], "/static/snaps/4_20.jpg");
    }

    #[test]
    fn missing_cell_fields_default_to_empty() {
        let detail: CellDetail = serde_json::from_value(json!({})).unwrap();
        assert_eq!(detail, CellDetail::default());
    }

    #[test]
    fn parses_results_with_flattened_summary() {
        let results: ResultsInfo = serde_json::from_value(json!({
            "video_id": 4,
            "detected_video": "/videos/detected/web_detected_4.mp4",
            "overlay_video": "/videos/detected/web_overlay_4.mp4",
            "heatmap_video": "/videos/heatmap/web_heatmap_4.mp4",
            "global_heatmap": "/static/outputs/global_heatmap_4.png",
            "total_moves": 10,
            "avg_dwell": 1.0,
            "top5": []
        }))
        .unwrap();

        assert_eq!(results.video_id, 4);
        assert_eq!(results.global_heatmap, "/static/outputs/global_heatmap_4.png");
        assert_eq!(results.summary.total_moves, 10);
    }

    #[test]
    fn parses_video_list() {
        let videos: Vec<VideoEntry> = serde_json::from_value(json!([
            {"id": 7, "name": "lobby.mp4"},
            {"id": 3, "name": "entrance.mp4"}
        ]))
        .unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, 7);
        assert_eq!(videos[1].name, "entrance.mp4");
    }
}
