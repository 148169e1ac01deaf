//! Map view state: what is shown, where, and which park popup is open.
//!
//! Created once at startup and updated on zoom and selection events; it is
//! the only place this state lives.

use std::time::Instant;

use rand::Rng;

use crate::aggregate::aggregate;
use crate::chart::ParkCharts;
use crate::config::{ChartConfig, MapConfig, PingOptions};
use crate::error::Result;
use crate::observations::ObservationSet;
use crate::quakes::{PingLayer, Quake};

/// Screen width, in pixels, the zoom level is calibrated against.
pub const VIEWPORT_PX: f64 = 1024.0;
const TILE_PX: f64 = 256.0;
/// Fraction of the visible span moved by one pan step.
const PAN_STEP: f64 = 0.1;
const ZOOM_STEP: f64 = 0.5;

/// How parks are drawn at the current zoom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Points,
    Polygons,
}

/// Visible part of the lat/lon plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl Viewport {
    /// Degrees of longitude across the screen.
    pub fn lon_span(&self) -> f64 {
        (360.0 * VIEWPORT_PX / (TILE_PX * 2f64.powf(self.zoom))).min(360.0)
    }

    pub fn lat_span(&self) -> f64 {
        (self.lon_span() / 2.0).min(180.0)
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.lon_span() / 2.0;
        [self.center_lon - half, self.center_lon + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.lat_span() / 2.0;
        [self.center_lat - half, self.center_lat + half]
    }

    /// Degrees per screen pixel, for sizing markers given in pixels.
    pub fn degrees_per_px(&self) -> f64 {
        self.lon_span() / VIEWPORT_PX
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center_lon = (self.center_lon + dx * PAN_STEP * self.lon_span()).clamp(-180.0, 180.0);
        self.center_lat = (self.center_lat + dy * PAN_STEP * self.lat_span()).clamp(-90.0, 90.0);
    }
}

/// An open park popup; dropped as a whole when closed.
#[derive(Clone, Debug)]
pub struct Popup {
    pub charts: ParkCharts,
    /// Stacked status whose share is overlaid on the category chart.
    pub focus: Option<usize>,
}

impl Popup {
    pub fn park(&self) -> &str {
        &self.charts.aggregate.park
    }

    pub fn focused_key(&self) -> Option<&str> {
        self.focus
            .and_then(|i| self.charts.stacked.keys.get(i))
            .map(String::as_str)
    }

    /// Steps the focus through `None, 0, 1, ..., n-1, None`.
    pub fn cycle_focus(&mut self, forward: bool) {
        let n = self.charts.stacked.keys.len();
        if n == 0 {
            self.focus = None;
            return;
        }
        self.focus = match (self.focus, forward) {
            (None, true) => Some(0),
            (None, false) => Some(n - 1),
            (Some(i), true) if i + 1 < n => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            _ => None,
        };
    }
}

pub struct ViewController {
    mode: DisplayMode,
    viewport: Viewport,
    map: MapConfig,
    chart: ChartConfig,
    popup: Option<Popup>,
    pings: PingLayer,
    pings_paused: bool,
}

impl ViewController {
    pub fn new(map: MapConfig, chart: ChartConfig, pings: PingOptions) -> Self {
        let viewport = Viewport {
            center_lon: map.center_lon,
            center_lat: map.center_lat,
            zoom: map.zoom,
        };
        let mut view = Self {
            mode: DisplayMode::Points,
            viewport,
            map,
            chart,
            popup: None,
            pings: PingLayer::new(pings),
            pings_paused: false,
        };
        view.on_zoom();
        view
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn popup_mut(&mut self) -> Option<&mut Popup> {
        self.popup.as_mut()
    }

    pub fn pings(&self) -> &PingLayer {
        &self.pings
    }

    /// Switches points/polygons when the zoom crosses the threshold.
    fn on_zoom(&mut self) {
        let wanted = if self.viewport.zoom >= self.map.polygon_zoom {
            DisplayMode::Polygons
        } else {
            DisplayMode::Points
        };
        if wanted != self.mode {
            log::debug!("zoom {:.1}: showing {:?}", self.viewport.zoom, wanted);
            self.mode = wanted;
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.zoom = zoom.clamp(self.map.min_zoom, self.map.max_zoom);
        self.on_zoom();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.viewport.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.viewport.zoom - ZOOM_STEP);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    pub fn center_on(&mut self, lon: f64, lat: f64) {
        self.viewport.center_lon = lon;
        self.viewport.center_lat = lat;
    }

    /// Opens the popup for `park`, replacing any open one.
    pub fn select(&mut self, observations: &ObservationSet, park: &str) -> Result<&Popup> {
        let agg = aggregate(observations.records(), park)?;
        log::info!(
            "{}: {} observations in {} categories",
            park,
            agg.total(),
            agg.category_counts.len()
        );
        let charts = ParkCharts::build(agg, &self.chart.baseline_statuses, &self.chart.frame);
        // a popup is about to be open either way
        self.pings.set_paused(true);
        Ok(&*self.popup.insert(Popup { charts, focus: None }))
    }

    pub fn close_popup(&mut self) {
        if let Some(popup) = self.popup.take() {
            log::debug!("closed popup for {}", popup.park());
        }
        self.sync_pings();
    }

    pub fn toggle_pings(&mut self) {
        self.pings_paused = !self.pings_paused;
        self.sync_pings();
    }

    // Pings hold still while a popup is open.
    fn sync_pings(&mut self) {
        self.pings.set_paused(self.pings_paused || self.popup.is_some());
    }

    pub fn tick<R: Rng>(&mut self, now: Instant, quakes: &[Quake], rng: &mut R) {
        self.pings.tick(now, quakes, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::Observation;

    fn view() -> ViewController {
        ViewController::new(MapConfig::default(), ChartConfig::default(), PingOptions::default())
    }

    fn observations() -> ObservationSet {
        ObservationSet::new(vec![
            Observation::new("X", "Bird", "Endangered"),
            Observation::new("X", "Bird", "Threatened"),
            Observation::new("X", "Fish", "No Concern"),
        ])
    }

    #[test]
    fn starts_with_points_and_switches_at_threshold() {
        let mut v = view();
        assert_eq!(v.mode(), DisplayMode::Points);
        v.set_zoom(5.0);
        assert_eq!(v.mode(), DisplayMode::Polygons);
        v.zoom_out();
        assert_eq!(v.mode(), DisplayMode::Points);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = view();
        v.set_zoom(100.0);
        assert_eq!(v.viewport().zoom, MapConfig::default().max_zoom);
        v.set_zoom(-3.0);
        assert_eq!(v.viewport().zoom, MapConfig::default().min_zoom);
    }

    #[test]
    fn span_halves_per_zoom_level() {
        let mut vp = Viewport { center_lon: 0.0, center_lat: 0.0, zoom: 4.0 };
        let wide = vp.lon_span();
        vp.zoom = 5.0;
        assert!((wide / vp.lon_span() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn select_opens_popup_and_pauses_pings() {
        let mut v = view();
        let popup = v.select(&observations(), "X").unwrap();
        assert_eq!(popup.park(), "X");
        assert_eq!(popup.charts.stacked.keys, vec!["Endangered", "Threatened"]);
        assert!(v.pings().is_paused());

        v.close_popup();
        assert!(v.popup().is_none());
        assert!(!v.pings().is_paused());
    }

    #[test]
    fn selecting_an_unknown_park_gives_an_empty_popup() {
        let mut v = view();
        let popup = v.select(&observations(), "Nowhere").unwrap();
        assert!(popup.charts.aggregate.is_empty());
        assert_eq!(popup.charts.simple.domain, [0.0, 0.0]);
    }

    #[test]
    fn focus_cycles_through_keys_and_back_to_none() {
        let mut v = view();
        v.select(&observations(), "X").unwrap();
        let popup = v.popup_mut().unwrap();
        popup.cycle_focus(true);
        assert_eq!(popup.focused_key(), Some("Endangered"));
        popup.cycle_focus(true);
        assert_eq!(popup.focused_key(), Some("Threatened"));
        popup.cycle_focus(true);
        assert_eq!(popup.focused_key(), None);
        popup.cycle_focus(false);
        assert_eq!(popup.focused_key(), Some("Threatened"));
    }
}
