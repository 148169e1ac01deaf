//! Chart scales for the popup bar charts.
//!
//! Positions are in chart pixels on a fixed canvas (see [`ChartFrame`]),
//! x growing right and y growing down. Nothing here reads the clock or a
//! random source, so identical counts always give identical scales.

use serde::Deserialize;

use crate::aggregate::{CategoryCounts, CategoryStatusCounts};

/// Canvas size and margins shared by both charts.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartFrame {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Extra room under the top margin for the chart titles.
    pub title_offset: f64,
    /// Band padding as a fraction of the band step.
    pub padding: f64,
}

impl Default for ChartFrame {
    fn default() -> Self {
        Self {
            width: 928.0,
            height: 570.0,
            margin_top: 30.0,
            margin_right: 15.0,
            margin_bottom: 40.0,
            margin_left: 105.0,
            title_offset: 20.0,
            padding: 0.1,
        }
    }
}

impl ChartFrame {
    pub fn x_range(&self) -> [f64; 2] {
        [self.margin_left, self.width - self.margin_right]
    }

    pub fn y_range(&self) -> [f64; 2] {
        [self.margin_top + self.title_offset, self.height - self.margin_bottom]
    }
}

/// Continuous scale from a numeric domain onto a pixel range.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// A collapsed domain (e.g. `[0, 0]` for an empty chart) maps every
    /// value to the start of the range.
    pub fn map(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Round tick values covering the domain, roughly `count` of them,
    /// stepping by 1, 2 or 5 times a power of ten.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [d0, d1] = self.domain;
        if count == 0 || !(d1 > d0) {
            return vec![d0];
        }
        let raw = (d1 - d0) / count as f64;
        let power = 10f64.powf(raw.log10().floor());
        let err = raw / power;
        let factor = if err >= 50f64.sqrt() {
            10.0
        } else if err >= 10f64.sqrt() {
            5.0
        } else if err >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };
        let step = factor * power;
        let first = (d0 / step).ceil() as i64;
        let last = (d1 / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Discrete scale placing categories into equal bands with padding.
#[derive(Clone, Debug, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    range: [f64; 2],
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// `padding` is used for both the gaps between bands and the gaps at
    /// either end of the range.
    pub fn new(domain: Vec<String>, range: [f64; 2], padding: f64) -> Self {
        let padding = padding.clamp(0.0, 1.0);
        let n = domain.len() as f64;
        let [r0, r1] = range;
        let (lo, hi) = if r1 < r0 { (r1, r0) } else { (r0, r1) };

        let (start, step, bandwidth) = if domain.is_empty() {
            (lo, 0.0, 0.0)
        } else {
            let step = (hi - lo) / (n - padding + padding * 2.0).max(1.0);
            let start = lo + (hi - lo - step * (n - padding)) * 0.5;
            (start, step, step * (1.0 - padding))
        };

        Self { domain, range, start, step, bandwidth }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Leading edge of the band for `category`.
    pub fn position(&self, category: &str) -> Option<f64> {
        let index = self.domain.iter().position(|c| c == category)?;
        let reversed = self.range[1] < self.range[0];
        let slot = if reversed { self.domain.len() - 1 - index } else { index };
        Some(self.start + self.step * slot as f64)
    }

    pub fn center(&self, category: &str) -> Option<f64> {
        self.position(category).map(|p| p + self.bandwidth / 2.0)
    }
}

/// Categories by descending count; equal counts keep first-occurrence order.
pub fn category_ordering(counts: &CategoryCounts) -> Vec<String> {
    let mut entries: Vec<(&String, u64)> = counts.iter().map(|(k, v)| (k, *v)).collect();
    // sort_by is stable
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().map(|(k, _)| k.clone()).collect()
}

/// One status layer of the stacked chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackSeries {
    pub key: String,
    pub segments: Vec<StackSegment>,
}

/// `[lower, upper)` of one category's bar taken up by one status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackSegment {
    pub category: String,
    pub lower: u64,
    pub upper: u64,
}

impl StackSegment {
    pub fn value(&self) -> u64 {
        self.upper - self.lower
    }
}

/// Layers `keys` on top of each other for every category in `ordering`.
/// A status missing from a category contributes an empty segment.
pub fn stack_series(
    counts: &CategoryStatusCounts,
    ordering: &[String],
    keys: &[String],
) -> Vec<StackSeries> {
    let mut running = vec![0u64; ordering.len()];
    keys.iter()
        .map(|key| {
            let segments = ordering
                .iter()
                .zip(running.iter_mut())
                .map(|(category, base)| {
                    let value = counts
                        .get(category)
                        .and_then(|statuses| statuses.get(key))
                        .copied()
                        .unwrap_or(0);
                    let lower = *base;
                    *base += value;
                    StackSegment { category: category.clone(), lower, upper: *base }
                })
                .collect();
            StackSeries { key: key.clone(), segments }
        })
        .collect()
}

/// Largest per-category sum over `keys`.
pub fn stacked_max(counts: &CategoryStatusCounts, keys: &[String]) -> u64 {
    counts
        .values()
        .map(|statuses| keys.iter().filter_map(|k| statuses.get(k)).sum::<u64>())
        .max()
        .unwrap_or(0)
}

/// Scales for the plain "species by category" chart.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleScales {
    pub ordering: Vec<String>,
    pub domain: [f64; 2],
    pub x: LinearScale,
    pub y: BandScale,
}

pub fn derive_simple(counts: &CategoryCounts, frame: &ChartFrame) -> SimpleScales {
    let ordering = category_ordering(counts);
    let max = counts.values().copied().max().unwrap_or(0);
    let domain = [0.0, max as f64];
    SimpleScales {
        x: LinearScale::new(domain, frame.x_range()),
        y: BandScale::new(ordering.clone(), frame.y_range(), frame.padding),
        ordering,
        domain,
    }
}

/// Scales and layers for the stacked "species by status" chart.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedScales {
    pub ordering: Vec<String>,
    pub keys: Vec<String>,
    pub domain: [f64; 2],
    pub x: LinearScale,
    pub y: BandScale,
    pub series: Vec<StackSeries>,
}

/// `keys` is the ordered list of statuses to stack; the category axis
/// still follows the overall category counts.
pub fn derive_stacked(
    counts: &CategoryCounts,
    status_counts: &CategoryStatusCounts,
    keys: &[String],
    frame: &ChartFrame,
) -> StackedScales {
    let ordering = category_ordering(counts);
    let domain = [0.0, stacked_max(status_counts, keys) as f64];
    StackedScales {
        x: LinearScale::new(domain, frame.x_range()),
        y: BandScale::new(ordering.clone(), frame.y_range(), frame.padding),
        series: stack_series(status_counts, &ordering, keys),
        keys: keys.to_vec(),
        ordering,
        domain,
    }
}
