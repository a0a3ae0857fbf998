//! One-call analysis: load, attribute, aggregate.

use crate::attribution::{self, Attribution};
use crate::dwell::{self, DwellReport};
use crate::region::Region;
use crate::sample::{self, GazeSample, InputFormat, LoadError, SkippedRow};
use std::path::Path;

/// Everything produced for one gaze stream against one region set.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub attribution: Attribution,
    pub report: DwellReport,
    /// Rows dropped while loading; empty when samples were passed in directly.
    pub skipped: Vec<SkippedRow>,
}

/// Attribute samples to regions and aggregate dwell time.
pub fn analyze(samples: Vec<GazeSample>, regions: &[Region]) -> Analysis {
    let attribution = attribution::attribute(samples, regions);
    let report = dwell::aggregate(&attribution.samples, regions.len());
    Analysis {
        attribution,
        report,
        skipped: Vec::new(),
    }
}

/// Load a gaze file and analyze it against `regions`.
pub fn analyze_file(
    path: impl AsRef<Path>,
    format: &InputFormat,
    regions: &[Region],
) -> Result<Analysis, LoadError> {
    let loaded = sample::load(path, format)?;
    let mut analysis = analyze(loaded.samples, regions);
    analysis.skipped = loaded.skipped;

    tracing::info!(
        regions = regions.len(),
        inside = analysis.report.attributed_samples,
        samples = analysis.report.total_samples,
        skipped = analysis.skipped.len(),
        total_ms = analysis.report.total,
        "gaze analysis complete"
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dwell::DwellEntry;

    #[test]
    fn test_overlapping_regions_scenario() {
        let regions = vec![
            Region::from_corners(0.0, 0.0, 10.0, 10.0),
            Region::from_corners(5.0, 5.0, 15.0, 15.0),
        ];
        let samples = vec![
            GazeSample::new(7.0, 7.0, 0.0),
            GazeSample::new(20.0, 20.0, 5.0),
            GazeSample::new(1.0, 1.0, 8.0),
        ];
        let analysis = analyze(samples, &regions);
        // deltas are [5, 3, 0]; region 0 holds the first and last samples
        assert_eq!(
            analysis.report.entries(),
            vec![
                DwellEntry::Region { index: 0, dwell: 5.0 },
                DwellEntry::Region { index: 1, dwell: 0.0 },
                DwellEntry::Total { dwell: 5.0 },
            ]
        );
        assert_eq!(analysis.report.attributed_samples, 2);
        assert_eq!(analysis.report.total_samples, 3);
    }

    #[test]
    fn test_empty_region_list_scenario() {
        let samples = vec![GazeSample::new(1.0, 1.0, 0.0), GazeSample::new(2.0, 2.0, 10.0)];
        let analysis = analyze(samples, &[]);
        assert_eq!(analysis.report.entries(), vec![DwellEntry::Total { dwell: 0.0 }]);
        assert_eq!(analysis.attribution.attributed_count(), 0);
    }

    #[test]
    fn test_no_samples_at_all() {
        let regions = vec![Region::from_corners(0.0, 0.0, 1.0, 1.0)];
        let analysis = analyze(vec![], &regions);
        assert_eq!(analysis.report.per_region, vec![0.0]);
        assert_eq!(analysis.report.total, 0.0);
    }
}
