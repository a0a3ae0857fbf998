//! Gaze-to-region attribution.
//!
//! Samples are sorted by timestamp (stable, so equal timestamps keep file
//! order), each sample gets the time until its successor as its dwell
//! delta, and each sample is assigned to the first region in detector order
//! that contains it. Overlapping regions therefore resolve to the lowest
//! index. Cost is O(samples × regions), fine for tens of faces and
//! thousands of samples.

use crate::region::Region;
use crate::sample::GazeSample;
use serde::Serialize;

/// A gaze sample after attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedSample {
    #[serde(flatten)]
    pub sample: GazeSample,
    /// Index into the region set, or `None` when no region contains the point.
    pub region_index: Option<usize>,
    /// Time until the next sample in timestamp order; 0 for the last sample.
    pub dwell_delta: f64,
}

/// Attributed samples in timestamp order.
#[derive(Debug, Clone)]
pub struct Attribution {
    pub samples: Vec<AttributedSample>,
    pub region_count: usize,
}

impl Attribution {
    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    /// Samples that landed in some region.
    pub fn attributed_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| s.region_index.is_some())
            .count()
    }

    pub fn unattributed_count(&self) -> usize {
        self.total_samples() - self.attributed_count()
    }
}

/// Index of the first region containing `(x, y)`, if any.
pub fn find_region(regions: &[Region], x: f64, y: f64) -> Option<usize> {
    regions.iter().position(|r| r.contains(x, y))
}

/// Time from each sample to its successor; the last sample gets 0.
///
/// Expects samples already in timestamp order. Adjacent duplicates give 0.
pub fn dwell_deltas(sorted: &[GazeSample]) -> Vec<f64> {
    let mut deltas: Vec<f64> = sorted
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .collect();
    if !sorted.is_empty() {
        deltas.push(0.0);
    }
    deltas
}

/// Sort samples by timestamp and attribute each one to a region.
pub fn attribute(mut samples: Vec<GazeSample>, regions: &[Region]) -> Attribution {
    samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    let deltas = dwell_deltas(&samples);

    let attributed: Vec<AttributedSample> = samples
        .into_iter()
        .zip(deltas)
        .map(|(sample, dwell_delta)| AttributedSample {
            region_index: find_region(regions, sample.x, sample.y),
            sample,
            dwell_delta,
        })
        .collect();

    let attribution = Attribution {
        samples: attributed,
        region_count: regions.len(),
    };

    let inside = attribution.attributed_count();
    if inside == 0 {
        tracing::warn!(
            samples = attribution.total_samples(),
            regions = regions.len(),
            "no gaze sample fell inside any face region"
        );
    } else {
        tracing::debug!(
            inside,
            outside = attribution.unattributed_count(),
            regions = regions.len(),
            "attributed gaze samples"
        );
    }

    attribution
}
