//! Geometry for the two popup charts, in chart pixels.
//!
//! This is what the renderer draws: no terminal types here, just rectangles,
//! labels and colors laid out from the derived scales.

use crate::aggregate::{CategoryCounts, ParkAggregate, stack_keys};
use crate::scale::{
    BandScale, ChartFrame, LinearScale, SimpleScales, StackedScales, derive_simple, derive_stacked,
};

pub type Rgb = (u8, u8, u8);

/// Fill of the category bars.
pub const CATEGORY_FILL: Rgb = (0x1b, 0x4d, 0x2b);

/// Categorical palette for stacked statuses (Dark2).
pub const STATUS_PALETTE: [Rgb; 8] = [
    (0x1b, 0x9e, 0x77),
    (0xd9, 0x5f, 0x02),
    (0x75, 0x70, 0xb3),
    (0xe7, 0x29, 0x8a),
    (0x66, 0xa6, 0x1e),
    (0xe6, 0xab, 0x02),
    (0xa6, 0x76, 0x1d),
    (0x66, 0x66, 0x66),
];

const X_TICKS: usize = 5;
const LEGEND_SPACING: f64 = 150.0;
const LEGEND_DROP: f64 = 30.0;

pub fn status_color(index: usize) -> Rgb {
    STATUS_PALETTE[index % STATUS_PALETTE.len()]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub category: String,
    /// Status layer for stacked bars.
    pub key: Option<String>,
    pub value: u64,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub x: f64,
    pub y: f64,
    pub key: String,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub frame: ChartFrame,
    pub title: Option<String>,
    pub subtitle: String,
    pub bars: Vec<Bar>,
    pub value_labels: Vec<Label>,
    /// Along the bottom axis.
    pub x_ticks: Vec<Label>,
    /// Along the left axis, centered on each band.
    pub y_ticks: Vec<Label>,
    pub legend: Vec<LegendEntry>,
}

impl ChartLayout {
    fn empty(frame: &ChartFrame, title: Option<String>, subtitle: &str) -> Self {
        Self {
            frame: frame.clone(),
            title,
            subtitle: subtitle.to_string(),
            bars: Vec::new(),
            value_labels: Vec::new(),
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            legend: Vec::new(),
        }
    }

    fn axis_labels(&mut self, x: &LinearScale, y: &BandScale) {
        let baseline = self.frame.height - self.frame.margin_bottom;
        self.x_ticks = x
            .ticks(X_TICKS)
            .into_iter()
            .map(|t| Label { x: x.map(t), y: baseline, text: format_tick(t) })
            .collect();
        self.y_ticks = y
            .domain()
            .iter()
            .filter_map(|c| y.center(c).map(|cy| Label { x: self.frame.margin_left, y: cy, text: c.clone() }))
            .collect();
    }
}

pub fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 { format!("{}", value as i64) } else { format!("{:.1}", value) }
}

/// "Species by category": one bar per category with its count at the tip.
pub fn category_chart(park: &str, counts: &CategoryCounts, scales: &SimpleScales, frame: &ChartFrame) -> ChartLayout {
    let mut layout = ChartLayout::empty(frame, Some(park.to_string()), "Species by category");
    let x0 = scales.x.map(0.0);
    let band = scales.y.bandwidth();

    for category in &scales.ordering {
        let (Some(y), Some(&count)) = (scales.y.position(category), counts.get(category)) else {
            continue;
        };
        let tip = scales.x.map(count as f64);
        layout.bars.push(Bar {
            x: x0,
            y,
            width: tip - frame.margin_left,
            height: band,
            category: category.clone(),
            key: None,
            value: count,
            color: CATEGORY_FILL,
        });
        layout.value_labels.push(Label { x: tip, y: y + band / 1.5, text: count.to_string() });
    }

    layout.axis_labels(&scales.x, &scales.y);
    layout
}

/// "Species by conservation status": stacked segments plus a legend.
pub fn status_chart(scales: &StackedScales, frame: &ChartFrame) -> ChartLayout {
    let mut layout = ChartLayout::empty(frame, None, "Species by conservation status");
    let band = scales.y.bandwidth();

    for (i, series) in scales.series.iter().enumerate() {
        for seg in &series.segments {
            let Some(y) = scales.y.position(&seg.category) else { continue };
            let x = scales.x.map(seg.lower as f64);
            layout.bars.push(Bar {
                x,
                y,
                width: scales.x.map(seg.upper as f64) - x,
                height: band,
                category: seg.category.clone(),
                key: Some(series.key.clone()),
                value: seg.value(),
                color: status_color(i),
            });
        }
    }

    let legend_y = frame.height - frame.margin_bottom + LEGEND_DROP;
    layout.legend = scales
        .keys
        .iter()
        .enumerate()
        .map(|(i, key)| LegendEntry {
            x: frame.margin_left + i as f64 * LEGEND_SPACING,
            y: legend_y,
            key: key.clone(),
            color: status_color(i),
        })
        .collect();

    layout.axis_labels(&scales.x, &scales.y);
    layout
}

/// Segments of one status redrawn on the category chart's scale, so the
/// share of that status shows up inside each category bar.
pub fn focus_overlay(simple: &SimpleScales, stacked: &StackedScales, key_index: usize, frame: &ChartFrame) -> Vec<Bar> {
    let Some(series) = stacked.series.get(key_index) else {
        return Vec::new();
    };
    series
        .segments
        .iter()
        .filter(|seg| seg.value() > 0)
        .filter_map(|seg| {
            let y = simple.y.position(&seg.category)?;
            Some(Bar {
                x: frame.margin_left,
                y,
                width: simple.x.map(seg.upper as f64) - simple.x.map(seg.lower as f64),
                height: simple.y.bandwidth(),
                category: seg.category.clone(),
                key: Some(series.key.clone()),
                value: seg.value(),
                color: status_color(key_index),
            })
        })
        .collect()
}

/// Everything a popup shows for one park, built once when it opens.
#[derive(Clone, Debug, PartialEq)]
pub struct ParkCharts {
    pub aggregate: ParkAggregate,
    pub simple: SimpleScales,
    pub stacked: StackedScales,
    pub category: ChartLayout,
    pub status: ChartLayout,
}

impl ParkCharts {
    /// Derives both charts; `baseline` statuses are left out of the stack.
    pub fn build(aggregate: ParkAggregate, baseline: &[String], frame: &ChartFrame) -> Self {
        let keys = stack_keys(&aggregate.statuses, baseline);
        let simple = derive_simple(&aggregate.category_counts, frame);
        let stacked = derive_stacked(
            &aggregate.category_counts,
            &aggregate.category_status_counts,
            &keys,
            frame,
        );
        let category = category_chart(&aggregate.park, &aggregate.category_counts, &simple, frame);
        let status = status_chart(&stacked, frame);
        Self { aggregate, simple, stacked, category, status }
    }

    pub fn overlay(&self, key_index: usize) -> Vec<Bar> {
        focus_overlay(&self.simple, &self.stacked, key_index, &self.category.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::observations::Observation;

    fn charts() -> ParkCharts {
        let records = vec![
            Observation::new("X", "Bird", "Endangered"),
            Observation::new("X", "Bird", "No Concern"),
            Observation::new("X", "Bird", "Threatened"),
            Observation::new("X", "Fish", "No Concern"),
            Observation::new("X", "Fish", "Endangered"),
            Observation::new("X", "Plant", "Endangered"),
        ];
        let agg = aggregate(&records, "X").unwrap();
        ParkCharts::build(agg, &["No Concern".to_string()], &ChartFrame::default())
    }

    #[test]
    fn category_bars_start_at_the_left_margin() {
        let c = charts();
        let frame = ChartFrame::default();
        assert_eq!(c.category.title.as_deref(), Some("X"));
        assert_eq!(c.category.bars.len(), 3);
        let bird = &c.category.bars[0];
        assert_eq!(bird.category, "Bird");
        assert_eq!(bird.x, frame.margin_left);
        assert_eq!(bird.width, frame.width - frame.margin_right - frame.margin_left);
        assert_eq!(c.category.value_labels[0].text, "3");
    }

    #[test]
    fn baseline_status_is_not_stacked() {
        let c = charts();
        assert_eq!(c.stacked.keys, vec!["Endangered", "Threatened"]);
        assert!(c.status.bars.iter().all(|b| b.key.as_deref() != Some("No Concern")));
        assert_eq!(c.status.legend.len(), 2);
        assert_eq!(c.status.legend[1].x, 105.0 + 150.0);
    }

    #[test]
    fn stacked_bars_abut() {
        let c = charts();
        let bird: Vec<&Bar> = c.status.bars.iter().filter(|b| b.category == "Bird").collect();
        assert_eq!(bird.len(), 2);
        assert!((bird[0].x + bird[0].width - bird[1].x).abs() < 1e-9);
        // Bird: 1 Endangered + 1 Threatened = domain max
        assert!((bird[1].x + bird[1].width - c.stacked.x.map(2.0)).abs() < 1e-9);
    }

    #[test]
    fn overlay_uses_category_scale() {
        let c = charts();
        let overlay = c.overlay(0);
        assert_eq!(overlay.len(), 3);
        let per_unit = c.simple.x.map(1.0) - c.simple.x.map(0.0);
        assert!(overlay.iter().all(|b| (b.width - per_unit).abs() < 1e-9));
        assert!(c.overlay(9).is_empty());
    }

    #[test]
    fn ticks_are_formatted_without_noise() {
        assert_eq!(format_tick(4.0), "4");
        assert_eq!(format_tick(0.6000000000000001), "0.6");
    }
}
