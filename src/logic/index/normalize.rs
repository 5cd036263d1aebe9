//! Min-max reference statistics
//!
//! One `ReferenceStats` holds the (min, max) of every index constituent over
//! a comparison set. Under `Panel` scope there is a single set; under
//! `PerYear` there is one set per observed year.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::composite::{Constituent, CONSTITUENTS};
use crate::logic::config::NormalizationScope;
use crate::logic::features::{EngineeredPanel, FeatureVector};

/// Relative spread below which a constituent counts as constant
pub const DEGENERATE_TOLERANCE: f64 = 1e-12;

// ============================================================================
// RANGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn fit<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Range { min: v, max: v }),
            Some(r) => Some(Range {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    pub fn is_degenerate(&self) -> bool {
        let scale = 1.0f64.max(self.min.abs()).max(self.max.abs());
        self.max - self.min <= DEGENERATE_TOLERANCE * scale
    }

    /// Constant at zero, up to float noise
    pub fn is_zero(&self) -> bool {
        self.is_degenerate() && self.max.abs() <= DEGENERATE_TOLERANCE
    }

    /// Scaled into [0, 1]; constant ranges map to `neutral`
    pub fn scale(&self, value: f64, neutral: f64) -> f64 {
        if self.is_degenerate() {
            return neutral;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

// ============================================================================
// REFERENCE STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStats {
    /// One range per entry of `CONSTITUENTS`; `None` for an empty set
    ranges: Vec<Option<Range>>,
    pub samples: usize,
}

impl ReferenceStats {
    pub fn fit<'a, I>(vectors: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureVector>,
    {
        let vectors: Vec<&FeatureVector> = vectors.into_iter().collect();
        let ranges = CONSTITUENTS
            .iter()
            .map(|c| Range::fit(vectors.iter().map(|v| c.extract(v))))
            .collect();
        Self {
            ranges,
            samples: vectors.len(),
        }
    }

    pub fn range(&self, position: usize) -> Option<Range> {
        self.ranges.get(position).copied().flatten()
    }

    /// Normalized value of one constituent.
    ///
    /// A positive part that is zero across the whole set scores 0: nothing
    /// in the set is worsening.
    pub fn normalize(&self, position: usize, constituent: &Constituent, vector: &FeatureVector, neutral: f64) -> f64 {
        match (self.range(position), constituent) {
            (Some(range), Constituent::PositivePart(_)) if range.is_zero() => 0.0,
            (Some(range), _) => range.scale(constituent.extract(vector), neutral),
            (None, _) => neutral,
        }
    }

    /// No spread (or no samples) at `position`
    pub fn is_degenerate(&self, position: usize) -> bool {
        self.range(position).map_or(true, |r| r.is_degenerate())
    }

    /// Positions of constituents whose set has no spread
    pub fn degenerate_positions(&self) -> Vec<usize> {
        (0..self.ranges.len()).filter(|&p| self.is_degenerate(p)).collect()
    }
}

// ============================================================================
// NORMALIZATION REFERENCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NormalizationReference {
    Panel(ReferenceStats),
    PerYear(BTreeMap<i32, ReferenceStats>),
}

impl NormalizationReference {
    pub fn fit(engineered: &EngineeredPanel, scope: NormalizationScope) -> Self {
        match scope {
            NormalizationScope::Panel => {
                Self::Panel(ReferenceStats::fit(engineered.rows().map(|(_, r)| &r.features)))
            }
            NormalizationScope::PerYear => {
                let mut by_year: BTreeMap<i32, Vec<&FeatureVector>> = BTreeMap::new();
                for (_, row) in engineered.rows() {
                    by_year.entry(row.year).or_default().push(&row.features);
                }
                Self::PerYear(
                    by_year
                        .into_iter()
                        .map(|(year, vectors)| (year, ReferenceStats::fit(vectors)))
                        .collect(),
                )
            }
        }
    }

    pub fn scope(&self) -> NormalizationScope {
        match self {
            Self::Panel(_) => NormalizationScope::Panel,
            Self::PerYear(_) => NormalizationScope::PerYear,
        }
    }

    /// Comparison set for `year`.
    ///
    /// Per-year scope uses the latest year at or before `year`, or the
    /// earliest year when `year` precedes the panel.
    pub fn for_year(&self, year: i32) -> Option<&ReferenceStats> {
        match self {
            Self::Panel(stats) => Some(stats),
            Self::PerYear(by_year) => by_year
                .range(..=year)
                .next_back()
                .or_else(|| by_year.iter().next())
                .map(|(_, stats)| stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::layout::{IDX_CLIMATE_IMPACT_INDEX, IDX_IMPACT_LAG1, IDX_IMPACT_TREND};

    #[test]
    fn test_range_scale() {
        let r = Range::fit([2.0, 6.0, 4.0]).unwrap();
        assert_eq!(r.scale(4.0, 0.5), 0.5);
        assert_eq!(r.scale(6.0, 0.5), 1.0);
        assert_eq!(r.scale(-10.0, 0.5), 0.0);
        assert_eq!(r.scale(99.0, 0.5), 1.0);
    }

    #[test]
    fn test_constant_range_is_neutral() {
        let r = Range::fit([3.0, 3.0, 3.0]).unwrap();
        assert!(r.is_degenerate());
        assert_eq!(r.scale(3.0, 0.5), 0.5);
        assert_eq!(r.scale(100.0, 0.5), 0.5);
        assert!(Range::fit(std::iter::empty()).is_none());
    }

    #[test]
    fn test_flat_positive_part_scores_zero() {
        let flat = FeatureVector::default();
        let mut falling = FeatureVector::default();
        falling.values[IDX_IMPACT_TREND] = -3.0;
        falling.values[IDX_IMPACT_LAG1] = 2.0;
        let stats = ReferenceStats::fit([&flat, &falling]);

        let trend = CONSTITUENTS
            .iter()
            .position(|c| *c == Constituent::PositivePart(IDX_IMPACT_TREND))
            .unwrap();
        assert!(stats.range(trend).unwrap().is_zero());
        assert_eq!(stats.normalize(trend, &CONSTITUENTS[trend], &flat, 0.5), 0.0);

        // Plain constant features still take the neutral score
        let intensity = CONSTITUENTS
            .iter()
            .position(|c| *c == Constituent::Feature(IDX_CLIMATE_IMPACT_INDEX))
            .unwrap();
        assert_eq!(stats.normalize(intensity, &CONSTITUENTS[intensity], &flat, 0.5), 0.5);
    }

    #[test]
    fn test_float_noise_is_degenerate() {
        let base = 0.1 + 0.2;
        let r = Range::fit([base, 0.3]).unwrap();
        assert!(r.is_degenerate());
    }

    #[test]
    fn test_per_year_lookup_falls_back() {
        let stats = ReferenceStats::fit(std::iter::empty::<&FeatureVector>());
        let mut by_year = BTreeMap::new();
        by_year.insert(2000, stats.clone());
        by_year.insert(2005, ReferenceStats { samples: 9, ..stats });
        let reference = NormalizationReference::PerYear(by_year);

        assert_eq!(reference.for_year(2007).unwrap().samples, 9);
        assert_eq!(reference.for_year(2003).unwrap().samples, 0);
        assert_eq!(reference.for_year(1990).unwrap().samples, 0);
        assert_eq!(reference.scope(), NormalizationScope::PerYear);
    }
}
