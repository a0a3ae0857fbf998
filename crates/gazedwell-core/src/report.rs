//! Summary table and overlay parameters derived from a [`DwellReport`].
//!
//! Nothing here touches the filesystem or pixels; callers write the CSV
//! string and draw the overlay items.

use crate::dwell::{DwellEntry, DwellReport};
use crate::region::Region;
use serde::{Deserialize, Serialize};

pub const FACE_HEADER: &str = "Face";
pub const TIME_HEADER: &str = "Time(ms)";
pub const TOTAL_LABEL: &str = "Total";

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Face")]
    pub face: String,
    #[serde(rename = "Time(ms)")]
    pub time_ms: f64,
}

/// Drawing parameters for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayItem {
    pub region: Region,
    /// Red channel strength in [0, 255], relative to the busiest region.
    pub intensity: u8,
    pub label: String,
}

/// 1-based face label, matching the face numbering on annotated images.
pub fn face_label(index: usize) -> String {
    format!("Face {}", index + 1)
}

/// Dwell label drawn next to a region, e.g. `"1250 ms"`.
pub fn dwell_label(dwell_ms: f64) -> String {
    format!("{dwell_ms:.0} ms")
}

/// `Face 1..N` rows followed by a `Total` row.
pub fn build(report: &DwellReport) -> Vec<ReportRow> {
    report
        .entries()
        .into_iter()
        .map(|entry| match entry {
            DwellEntry::Region { index, dwell } => ReportRow {
                face: face_label(index),
                time_ms: dwell,
            },
            DwellEntry::Total { dwell } => ReportRow {
                face: TOTAL_LABEL.to_string(),
                time_ms: dwell,
            },
        })
        .collect()
}

/// Render rows as CSV with a `Face,Time(ms)` header.
pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut output = String::new();
    output.push_str(FACE_HEADER);
    output.push(',');
    output.push_str(&escape_field(TIME_HEADER));
    output.push('\n');

    for row in rows {
        output.push_str(&escape_field(&row.face));
        output.push(',');
        output.push_str(&format_time(row.time_ms));
        output.push('\n');
    }

    output
}

/// Whole milliseconds keep a `.0` so the column always reads as a float.
fn format_time(ms: f64) -> String {
    if ms.is_finite() && ms.fract() == 0.0 {
        format!("{ms:.1}")
    } else {
        ms.to_string()
    }
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Map a region's dwell linearly onto [0, 255] against the busiest region.
///
/// The denominator never drops below 1, so an all-zero report maps to 0
/// everywhere. Unknown indices map to 0.
pub fn intensity(report: &DwellReport, index: usize) -> u8 {
    let Some(dwell) = report.dwell(index) else {
        return 0;
    };
    let denom = report.max_region_dwell().unwrap_or(0.0).max(1.0);
    (255.0 * dwell / denom).clamp(0.0, 255.0) as u8
}

/// Overlay items for every region, in region order.
pub fn overlay(report: &DwellReport, regions: &[Region]) -> Vec<OverlayItem> {
    regions
        .iter()
        .enumerate()
        .map(|(index, region)| {
            let dwell = report.dwell(index).unwrap_or(0.0);
            OverlayItem {
                region: *region,
                intensity: intensity(report, index),
                label: dwell_label(dwell),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(per_region: Vec<f64>) -> DwellReport {
        let total = per_region.iter().sum();
        DwellReport {
            per_region,
            total,
            attributed_samples: 0,
            total_samples: 0,
        }
    }

    #[test]
    fn test_build_labels() {
        let rows = build(&report(vec![8.0, 0.0]));
        assert_eq!(
            rows,
            vec![
                ReportRow { face: "Face 1".into(), time_ms: 8.0 },
                ReportRow { face: "Face 2".into(), time_ms: 0.0 },
                ReportRow { face: "Total".into(), time_ms: 8.0 },
            ]
        );
    }

    #[test]
    fn test_build_no_regions() {
        let rows = build(&report(vec![]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].face, "Total");
        assert_eq!(rows[0].time_ms, 0.0);
    }

    #[test]
    fn test_to_csv() {
        let csv = to_csv(&build(&report(vec![8.0, 2.5])));
        assert_eq!(csv, "Face,Time(ms)\nFace 1,8.0\nFace 2,2.5\nTotal,10.5\n");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0.0");
        assert_eq!(format_time(5.0), "5.0");
        assert_eq!(format_time(10.25), "10.25");
        assert_eq!(format_time(1234567.0), "1234567.0");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("Face 1"), "Face 1");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_intensity_scales_to_max() {
        let r = report(vec![100.0, 50.0, 0.0]);
        assert_eq!(intensity(&r, 0), 255);
        assert_eq!(intensity(&r, 1), 127);
        assert_eq!(intensity(&r, 2), 0);
        assert_eq!(intensity(&r, 9), 0);
    }

    #[test]
    fn test_intensity_all_zero() {
        let r = report(vec![0.0, 0.0]);
        assert_eq!(intensity(&r, 0), 0);
        assert_eq!(intensity(&r, 1), 0);
    }

    #[test]
    fn test_intensity_small_dwell_uses_unit_denominator() {
        // max dwell below 1 ms: denominator is 1
        let r = report(vec![0.5]);
        assert_eq!(intensity(&r, 0), 127);
    }

    #[test]
    fn test_intensity_negative_clamped() {
        let r = report(vec![-5.0, 10.0]);
        assert_eq!(intensity(&r, 0), 0);
    }

    #[test]
    fn test_dwell_label_rounds() {
        assert_eq!(dwell_label(1249.6), "1250 ms");
        assert_eq!(dwell_label(0.0), "0 ms");
    }

    #[test]
    fn test_overlay_items() {
        let regions = vec![
            Region::from_corners(0.0, 0.0, 10.0, 10.0),
            Region::from_corners(20.0, 20.0, 30.0, 30.0),
        ];
        let items = overlay(&report(vec![40.0, 10.0]), &regions);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].intensity, 255);
        assert_eq!(items[0].label, "40 ms");
        assert_eq!(items[1].intensity, 63);
        assert_eq!(items[1].region, regions[1]);
    }
}
