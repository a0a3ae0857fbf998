//! Per-region dwell-time aggregation.

use crate::attribution::AttributedSample;
use serde::{Deserialize, Serialize};

/// Cumulative dwell time per region plus the attributed total.
///
/// Every region index appears, including regions nobody looked at.
/// Unattributed time is not part of any sum; it shows up only as
/// `attributed_samples < total_samples`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellReport {
    /// Dwell time indexed by region.
    pub per_region: Vec<f64>,
    pub total: f64,
    pub attributed_samples: usize,
    pub total_samples: usize,
}

/// One line of a [`DwellReport`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellEntry {
    Region { index: usize, dwell: f64 },
    Total { dwell: f64 },
}

impl DwellReport {
    pub fn region_count(&self) -> usize {
        self.per_region.len()
    }

    pub fn dwell(&self, index: usize) -> Option<f64> {
        self.per_region.get(index).copied()
    }

    /// Largest per-region dwell, or `None` when there are no regions.
    pub fn max_region_dwell(&self) -> Option<f64> {
        self.per_region.iter().copied().reduce(f64::max)
    }

    /// Region entries in index order followed by the total; always
    /// `region_count() + 1` long.
    pub fn entries(&self) -> Vec<DwellEntry> {
        self.per_region
            .iter()
            .enumerate()
            .map(|(index, &dwell)| DwellEntry::Region { index, dwell })
            .chain(std::iter::once(DwellEntry::Total { dwell: self.total }))
            .collect()
    }
}

/// Sum dwell deltas of attributed samples per region.
pub fn aggregate(attributed: &[AttributedSample], region_count: usize) -> DwellReport {
    let mut per_region = vec![0.0f64; region_count];
    let mut attributed_samples = 0usize;

    for sample in attributed {
        let Some(index) = sample.region_index else {
            continue;
        };
        match per_region.get_mut(index) {
            Some(slot) => {
                *slot += sample.dwell_delta;
                attributed_samples += 1;
            }
            None => {
                tracing::warn!(index, region_count, "sample attributed to unknown region; ignored");
            }
        }
    }

    let total = per_region.iter().sum();

    DwellReport {
        per_region,
        total,
        attributed_samples,
        total_samples: attributed.len(),
    }
}
