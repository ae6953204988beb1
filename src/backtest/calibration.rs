//! Confidence calibration.
//!
//! Groups scored predictions by the confidence the combiner attached to
//! them and reports how often each group was actually right.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::percentage;

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// A single prediction–outcome pair for calibration tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub confidence: f64,
    pub correct: bool,
}

/// Fixed confidence bands used for win-rate reporting.
///
/// The lowest band also absorbs everything under 60, so the 55–59
/// floor region is reported as part of `60-70%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceBand {
    #[serde(rename = "60-70%")]
    Band60To70,
    #[serde(rename = "71-80%")]
    Band71To80,
    #[serde(rename = "81-90%")]
    Band81To90,
    #[serde(rename = "91-95%")]
    Band91To95,
}

impl ConfidenceBand {
    pub const ALL: [ConfidenceBand; 4] = [
        ConfidenceBand::Band60To70,
        ConfidenceBand::Band71To80,
        ConfidenceBand::Band81To90,
        ConfidenceBand::Band91To95,
    ];

    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= 91.0 {
            ConfidenceBand::Band91To95
        } else if confidence >= 81.0 {
            ConfidenceBand::Band81To90
        } else if confidence >= 71.0 {
            ConfidenceBand::Band71To80
        } else {
            ConfidenceBand::Band60To70
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::Band60To70 => "60-70%",
            ConfidenceBand::Band71To80 => "71-80%",
            ConfidenceBand::Band81To90 => "81-90%",
            ConfidenceBand::Band91To95 => "91-95%",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse confidence categories: high ≥ 80, medium ≥ 65, low below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCategory {
    High,
    Medium,
    Low,
}

impl ConfidenceCategory {
    pub const ALL: [ConfidenceCategory; 3] = [
        ConfidenceCategory::High,
        ConfidenceCategory::Medium,
        ConfidenceCategory::Low,
    ];

    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceCategory::High
        } else if confidence >= 65.0 {
            ConfidenceCategory::Medium
        } else {
            ConfidenceCategory::Low
        }
    }
}

/// Win rate inside one confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandWinRate {
    pub band: ConfidenceBand,
    pub total: usize,
    pub correct: usize,
    /// Percent, two decimals.
    pub win_rate: f64,
}

/// Accuracy and sample share of one confidence category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: ConfidenceCategory,
    pub total: usize,
    pub correct: usize,
    /// Percent, two decimals.
    pub accuracy: f64,
    /// Percent of all points that fell into this category.
    pub share: f64,
}

/// Calibration analysis results. Empty groups are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub total_predictions: usize,
    pub win_rate_by_band: Vec<BandWinRate>,
    pub confidence_distribution: Vec<CategorySummary>,
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    points: Vec<CalibrationPoint>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scored prediction.
    pub fn add_point(&mut self, point: CalibrationPoint) {
        self.points.push(point);
    }

    /// Add multiple scored predictions.
    pub fn add_points<I: IntoIterator<Item = CalibrationPoint>>(&mut self, points: I) {
        self.points.extend(points);
    }

    /// Number of tracked predictions.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Generate a full calibration report.
    pub fn report(&self) -> CalibrationReport {
        CalibrationReport {
            total_predictions: self.points.len(),
            win_rate_by_band: self.win_rate_by_band(),
            confidence_distribution: self.confidence_distribution(),
        }
    }

    fn win_rate_by_band(&self) -> Vec<BandWinRate> {
        ConfidenceBand::ALL
            .iter()
            .filter_map(|&band| {
                let (total, correct) =
                    tally(self.points.iter().filter(|p| ConfidenceBand::for_confidence(p.confidence) == band));
                (total > 0).then(|| BandWinRate {
                    band,
                    total,
                    correct,
                    win_rate: percentage(correct, total),
                })
            })
            .collect()
    }

    fn confidence_distribution(&self) -> Vec<CategorySummary> {
        let all = self.points.len();
        ConfidenceCategory::ALL
            .iter()
            .filter_map(|&category| {
                let (total, correct) = tally(
                    self.points
                        .iter()
                        .filter(|p| ConfidenceCategory::for_confidence(p.confidence) == category),
                );
                (total > 0).then(|| CategorySummary {
                    category,
                    total,
                    correct,
                    accuracy: percentage(correct, total),
                    share: percentage(total, all),
                })
            })
            .collect()
    }
}

/// `(total, correct)` over a set of points.
fn tally<'a, I: Iterator<Item = &'a CalibrationPoint>>(points: I) -> (usize, usize) {
    points.fold((0, 0), |(total, correct), p| (total + 1, correct + p.correct as usize))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
