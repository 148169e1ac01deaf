use geo::{Coord, LineString};
use ratatui::layout::Rect as TuiRect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use std::time::Instant;

use crate::parks::{ParkCatalog, ParkFeature};
use crate::quakes::Quake;
use crate::view::{DisplayMode, ViewController};

const PARK_OUTLINE: Color = Color::Rgb(0x4e, 0x80, 0x6a);
const PARK_MARKER: Color = Color::Rgb(0x00, 0x00, 0x80);
const HIGHLIGHT: Color = Color::Red;
const PING: (u8, u8, u8) = (0xff, 0x45, 0x00);

pub fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Scales a color toward black; `opacity` in `[0, 1]`.
fn fade((r, g, b): (u8, u8, u8), opacity: f64) -> Color {
    let k = opacity.clamp(0.0, 1.0);
    Color::Rgb((r as f64 * k) as u8, (g as f64 * k) as u8, (b as f64 * k) as u8)
}

/// Closed outline of one ring.
fn draw_ring(ctx: &mut Context, ring: &LineString<f64>, color: Color) {
    for window in ring.0.windows(2) {
        let (a, b): (Coord<f64>, Coord<f64>) = (window[0], window[1]);
        ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
    }
    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        ctx.draw(&Line { x1: last.x, y1: last.y, x2: first.x, y2: first.y, color });
    }
}

/// One frame of the park map: parks as points or boundaries depending on
/// zoom, earthquakes underneath, pings on top.
pub struct MapView<'a> {
    catalog: &'a ParkCatalog,
    quakes: &'a [Quake],
    view: &'a ViewController,
    highlight: Option<&'a str>,
}

impl<'a> MapView<'a> {
    pub fn new(
        catalog: &'a ParkCatalog,
        quakes: &'a [Quake],
        view: &'a ViewController,
        highlight: Option<&'a str>,
    ) -> Self {
        Self { catalog, quakes, view, highlight }
    }

    pub fn render(&self, f: &mut Frame, area: TuiRect, now: Instant) {
        let viewport = self.view.viewport();
        let deg_per_px = viewport.degrees_per_px();
        let mode = self.view.mode();
        let title = format!(
            "Parks [{}] zoom {:.1}",
            match mode {
                DisplayMode::Points => "points",
                DisplayMode::Polygons => "boundaries",
            },
            viewport.zoom
        );

        let canvas = Canvas::default()
            .block(Block::default().title(title).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds())
            .y_bounds(viewport.y_bounds())
            .paint(|ctx| {
                // 1) earthquakes
                for q in self.quakes {
                    ctx.draw(&Points { coords: &[(q.longitude, q.latitude)], color: rgb(q.color()) });
                }
                ctx.layer();

                // 2) parks
                match mode {
                    DisplayMode::Points => {
                        for site in &self.catalog.sites {
                            let color = if Some(site.name.as_str()) == self.highlight { HIGHLIGHT } else { PARK_MARKER };
                            ctx.draw(&Circle {
                                x: site.lon,
                                y: site.lat,
                                radius: site.marker_radius() * deg_per_px,
                                color,
                            });
                            ctx.draw(&Points { coords: &[(site.lon, site.lat)], color: PARK_OUTLINE });
                        }
                    }
                    DisplayMode::Polygons => {
                        for boundary in &self.catalog.boundaries {
                            for poly in &boundary.shape.0 {
                                draw_ring(ctx, poly.exterior(), PARK_OUTLINE);
                            }
                        }
                    }
                }

                // 3) selected park on top, in red
                if let Some(sel) = self.highlight {
                    if let Some(feature) = self.catalog.feature(sel, mode == DisplayMode::Polygons) {
                        if let ParkFeature::Boundary(b) = feature {
                            for poly in &b.shape.0 {
                                draw_ring(ctx, poly.exterior(), HIGHLIGHT);
                            }
                        }
                        if let Some((x, y)) = feature.anchor() {
                            ctx.print(x, y, feature.park_name().to_string());
                        }
                    }
                }
                ctx.layer();

                // 4) pings
                let pings = self.view.pings();
                for ping in pings.pings() {
                    ctx.draw(&Circle {
                        x: ping.lon,
                        y: ping.lat,
                        radius: pings.radius(ping, now) * deg_per_px,
                        color: fade(PING, pings.opacity(ping, now)),
                    });
                }
            });
        f.render_widget(canvas, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_scales_toward_black() {
        assert_eq!(fade((200, 100, 50), 1.0), Color::Rgb(200, 100, 50));
        assert_eq!(fade((200, 100, 50), 0.5), Color::Rgb(100, 50, 25));
        assert_eq!(fade((200, 100, 50), -1.0), Color::Rgb(0, 0, 0));
    }
}
