//! Earthquake events and the "ping" animation drawn over them.

use rand::Rng;
use serde::Deserialize;
use std::{
    fs::File,
    io::Read,
    path::Path,
    time::{Duration, Instant},
};

use crate::config::PingOptions;
use crate::error::Result;

/// Magnitudes are colored over this range.
pub const MAGNITUDE_DOMAIN: [f64; 2] = [0.0, 10.0];
/// Legend grades shown next to the map.
pub const LEGEND_GRADES: [f64; 6] = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0];

// Yellow-orange-red sequential ramp, low to high.
const YL_OR_RD: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xcc),
    (0xff, 0xed, 0xa0),
    (0xfe, 0xd9, 0x76),
    (0xfe, 0xb2, 0x4c),
    (0xfd, 0x8d, 0x3c),
    (0xfc, 0x4e, 0x2a),
    (0xe3, 0x1a, 0x1c),
    (0xbd, 0x00, 0x26),
    (0x80, 0x00, 0x26),
];

/// One row of the USGS feed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Quake {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub mag: Option<f64>,
}

impl Quake {
    pub fn color(&self) -> (u8, u8, u8) {
        magnitude_color(self.mag.unwrap_or(0.0))
    }
}

pub fn load_quakes<P: AsRef<Path>>(path: P) -> Result<Vec<Quake>> {
    let path = path.as_ref();
    let quakes = read_quakes(File::open(path)?)?;
    log::info!("Loaded {} earthquakes from {}", quakes.len(), path.display());
    Ok(quakes)
}

pub fn read_quakes<R: Read>(reader: R) -> Result<Vec<Quake>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut quakes = Vec::new();
    for row in reader.deserialize::<Quake>() {
        match row {
            Ok(q) => quakes.push(q),
            Err(e) => log::debug!("Skipping earthquake row: {}", e),
        }
    }
    Ok(quakes)
}

/// Sequential color for a magnitude, clamped to [`MAGNITUDE_DOMAIN`].
pub fn magnitude_color(mag: f64) -> (u8, u8, u8) {
    let [lo, hi] = MAGNITUDE_DOMAIN;
    let t = ((mag - lo) / (hi - lo)).clamp(0.0, 1.0);
    let scaled = t * (YL_OR_RD.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(YL_OR_RD.len() - 2);
    let f = scaled - i as f64;
    let (a, b) = (YL_OR_RD[i], YL_OR_RD[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// A ring expanding out of one earthquake location.
#[derive(Clone, Debug, PartialEq)]
pub struct Ping {
    pub lon: f64,
    pub lat: f64,
    pub mag: Option<f64>,
    pub started: Instant,
}

/// Progress of a ping in `[0, 1]`.
fn progress(ping: &Ping, now: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(ping.started);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

/// Self-rescheduling ping timer, advanced by the event loop.
#[derive(Clone, Debug)]
pub struct PingLayer {
    options: PingOptions,
    pings: Vec<Ping>,
    next_at: Option<Instant>,
    paused: bool,
}

impl PingLayer {
    pub fn new(options: PingOptions) -> Self {
        Self { options, pings: Vec::new(), next_at: None, paused: false }
    }

    pub fn pings(&self) -> &[Ping] {
        &self.pings
    }

    /// Most recently fired ping still on screen.
    pub fn latest(&self) -> Option<&Ping> {
        self.pings.last()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stops new pings; running ones still fade out.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused && !paused {
            self.next_at = None;
        }
        self.paused = paused;
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.options.duration_ms)
    }

    fn delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter = rng.random_range(0.0..1.0) * self.options.jitter_ms as f64;
        Duration::from_millis(self.options.min_delay_ms) + Duration::from_secs_f64(jitter / 1000.0)
    }

    /// Expires finished pings and, when due, fires one at a random quake.
    pub fn tick<R: Rng>(&mut self, now: Instant, quakes: &[Quake], rng: &mut R) {
        let duration = self.duration();
        self.pings.retain(|p| progress(p, now, duration) < 1.0);

        if self.paused || quakes.is_empty() {
            return;
        }
        match self.next_at {
            Some(at) if now < at => {}
            _ => {
                let q = &quakes[rng.random_range(0..quakes.len())];
                self.pings.push(Ping { lon: q.longitude, lat: q.latitude, mag: q.mag, started: now });
                self.next_at = Some(now + self.delay(rng));
            }
        }
    }

    /// Ring radius in screen pixels.
    pub fn radius(&self, ping: &Ping, now: Instant) -> f64 {
        let [r0, r1] = self.options.radius_range;
        r0 + (r1 - r0) * progress(ping, now, self.duration())
    }

    pub fn opacity(&self, ping: &Ping, now: Instant) -> f64 {
        let [o0, o1] = self.options.opacity_range;
        o0 + (o1 - o0) * progress(ping, now, self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn quakes() -> Vec<Quake> {
        read_quakes(
            "time,latitude,longitude,depth,mag\n\
             2023-12-01T00:00:00Z,38.8,-122.8,2.1,1.2\n\
             2023-12-01T00:10:00Z,61.2,-150.0,40.0,\n\
             2023-12-01T00:20:00Z,bad,-150.0,40.0,3.0\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn reads_feed_and_tolerates_missing_magnitude() {
        let q = quakes();
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].mag, Some(1.2));
        assert_eq!(q[1].mag, None);
    }

    #[test]
    fn magnitude_ramp_endpoints() {
        assert_eq!(magnitude_color(0.0), YL_OR_RD[0]);
        assert_eq!(magnitude_color(10.0), YL_OR_RD[8]);
        assert_eq!(magnitude_color(42.0), YL_OR_RD[8]);
        assert_eq!(magnitude_color(-1.0), YL_OR_RD[0]);
    }

    #[test]
    fn pings_fire_expand_and_expire() {
        let mut layer = PingLayer::new(PingOptions::default());
        let mut rng = StdRng::seed_from_u64(7);
        let t0 = Instant::now();
        let q = quakes();

        layer.tick(t0, &q, &mut rng);
        assert_eq!(layer.pings().len(), 1);
        let ping = layer.pings()[0].clone();
        assert_eq!(layer.latest(), Some(&ping));
        assert!(q.iter().any(|e| e.mag == ping.mag && e.longitude == ping.lon));
        assert_eq!(layer.radius(&ping, t0), 5.0);
        assert_eq!(layer.opacity(&ping, t0), 1.0);

        // next ping is at least 100ms away
        layer.tick(t0 + Duration::from_millis(50), &q, &mut rng);
        assert_eq!(layer.pings().len(), 1);

        let late = t0 + Duration::from_millis(800);
        assert_eq!(layer.radius(&ping, late), 12.0);
        layer.tick(late, &q, &mut rng);
        assert!(layer.pings().iter().all(|p| p.started > t0));
    }

    #[test]
    fn paused_layer_only_fades() {
        let mut layer = PingLayer::new(PingOptions::default());
        let mut rng = StdRng::seed_from_u64(1);
        let t0 = Instant::now();
        layer.set_paused(true);
        layer.tick(t0, &quakes(), &mut rng);
        assert!(layer.pings().is_empty());
    }
}
